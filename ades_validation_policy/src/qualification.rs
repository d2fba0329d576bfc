// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Qualification of a certificate as determined from trusted lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateQualification {
    QcertForEsigQscd,
    QcertForEsealQscd,
    QcertForEsig,
    QcertForEseal,
    QcertForWsa,
    CertForEsig,
    CertForEseal,
    CertForWsa,
    QcertForUnknownQscd,
    QcertForUnknown,
    CertForUnknown,
    Na,
}

impl CertificateQualification {
    pub fn name(&self) -> &'static str {
        match self {
            Self::QcertForEsigQscd => "QCERT_FOR_ESIG_QSCD",
            Self::QcertForEsealQscd => "QCERT_FOR_ESEAL_QSCD",
            Self::QcertForEsig => "QCERT_FOR_ESIG",
            Self::QcertForEseal => "QCERT_FOR_ESEAL",
            Self::QcertForWsa => "QCERT_FOR_WSA",
            Self::CertForEsig => "CERT_FOR_ESIG",
            Self::CertForEseal => "CERT_FOR_ESEAL",
            Self::CertForWsa => "CERT_FOR_WSA",
            Self::QcertForUnknownQscd => "QCERT_FOR_UNKNOWN_QSCD",
            Self::QcertForUnknown => "QCERT_FOR_UNKNOWN",
            Self::CertForUnknown => "CERT_FOR_UNKNOWN",
            Self::Na => "NA",
        }
    }

    pub fn is_qualified(&self) -> bool {
        matches!(
            self,
            Self::QcertForEsigQscd
                | Self::QcertForEsealQscd
                | Self::QcertForEsig
                | Self::QcertForEseal
                | Self::QcertForWsa
                | Self::QcertForUnknownQscd
                | Self::QcertForUnknown
        )
    }

    pub fn is_qscd(&self) -> bool {
        matches!(
            self,
            Self::QcertForEsigQscd | Self::QcertForEsealQscd | Self::QcertForUnknownQscd
        )
    }
}

impl fmt::Display for CertificateQualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A qualification that applies from `start` (inclusive) until `end` (exclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationPeriod {
    pub qualification: CertificateQualification,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl QualificationPeriod {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && self.end.map_or(true, |end| instant < end)
    }
}

/// Time-indexed qualification determinations for one certificate.
///
/// Several trust services may qualify the same certificate, so more than one
/// period can cover a given instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationTimeline {
    periods: Vec<QualificationPeriod>,
}

impl QualificationTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        qualification: CertificateQualification,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) {
        self.periods.push(QualificationPeriod {
            qualification,
            start,
            end,
        });
    }

    pub fn with(
        mut self,
        qualification: CertificateQualification,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.add(qualification, start, end);
        self
    }

    pub fn periods(&self) -> &[QualificationPeriod] {
        &self.periods
    }

    pub fn qualifications_at(&self, instant: DateTime<Utc>) -> BTreeSet<CertificateQualification> {
        self.periods
            .iter()
            .filter(|period| period.contains(instant))
            .map(|period| period.qualification)
            .collect()
    }
}
