// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::chain::{Chain, ChainResult, Check};
use crate::conclusion::FailureIndication;
use crate::level::LevelConstraint;
use crate::message::MessageTag;
use crate::policy::QualificationConstraints;
use crate::qualification::{CertificateQualification, QualificationTimeline};

/// Passes iff exactly one qualification applies.
///
/// Fails with `FAILED` and no sub-indication. When several qualifications
/// conflict they are listed in the additional info.
pub fn qualification_conflict_check<'a>(
    qualifications: &'a BTreeSet<CertificateQualification>,
    level: LevelConstraint,
) -> Check<'a> {
    Check::new(
        MessageTag::QUAL_HAS_CONF,
        MessageTag::QUAL_HAS_CONF_ANS,
        level,
        move || qualifications.len() == 1,
    )
    .on_failure(FailureIndication::failed(None))
    .with_additional_info(move || {
        (qualifications.len() > 1).then(|| {
            let names: Vec<&str> = qualifications.iter().map(|q| q.name()).collect();
            format!("[{}]", names.join(", "))
        })
    })
}

pub fn qualification_at_time_chain(
    timeline: &QualificationTimeline,
    instant: DateTime<Utc>,
    constraints: &QualificationConstraints,
) -> ChainResult {
    let qualifications = timeline.qualifications_at(instant);
    debug!(%instant, count = qualifications.len(), "qualifications determined");

    Chain::new(format!("Certificate qualification at {instant}"))
        .then(qualification_conflict_check(
            &qualifications,
            constraints.qualification_conflict,
        ))
        .execute()
}
