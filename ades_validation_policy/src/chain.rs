// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Ordered chains of policy-constrained checks.
//!
//! A [`Chain`] is built for one result: each [`Check`] captures its inputs in
//! a predicate closure and declares the message tags and failure outcome
//! that apply to it. Executing the chain evaluates the checks strictly in
//! order:
//! - `IGNORE` checks are skipped without a trace
//! - failing `INFORM`/`WARN` checks are recorded and execution continues
//! - the first failing `FAIL` check sets the conclusion and stops the chain

use serde::Serialize;
use tracing::{debug, trace};

use crate::conclusion::{Conclusion, FailureIndication, Message};
use crate::level::LevelConstraint;
use crate::message::MessageTag;

type Predicate<'a> = Box<dyn Fn() -> bool + 'a>;
type InfoFn<'a> = Box<dyn Fn() -> Option<String> + 'a>;

/// One pass/fail question evaluated against captured inputs.
pub struct Check<'a> {
    message: MessageTag,
    error: MessageTag,
    level: LevelConstraint,
    predicate: Predicate<'a>,
    additional_info: Option<InfoFn<'a>>,
    failure: Option<FailureIndication>,
}

impl<'a> Check<'a> {
    pub fn new(
        message: MessageTag,
        error: MessageTag,
        level: LevelConstraint,
        predicate: impl Fn() -> bool + 'a,
    ) -> Self {
        Self {
            message,
            error,
            level,
            predicate: Box::new(predicate),
            additional_info: None,
            failure: None,
        }
    }

    /// Embeds a finished sub-chain: passes iff it passed, and a failure
    /// propagates the sub-chain's indication and sub-indication.
    pub fn from_result(
        message: MessageTag,
        error: MessageTag,
        level: LevelConstraint,
        result: &'a ChainResult,
    ) -> Self {
        let check = Self::new(message, error, level, move || result.is_passed());
        match result.conclusion().failure() {
            Some(failure) => check.on_failure(failure),
            None => check,
        }
    }

    /// Overrides the chain's default failure outcome for this check.
    pub fn on_failure(mut self, failure: FailureIndication) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Details reported with the failure entry.
    pub fn with_additional_info(mut self, info: impl Fn() -> Option<String> + 'a) -> Self {
        self.additional_info = Some(Box::new(info));
        self
    }

    pub fn message(&self) -> MessageTag {
        self.message
    }

    pub fn error(&self) -> MessageTag {
        self.error
    }

    pub fn level(&self) -> LevelConstraint {
        self.level
    }

    pub fn failure(&self) -> Option<FailureIndication> {
        self.failure
    }
}

impl std::fmt::Debug for Check<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("message", &self.message.id)
            .field("level", &self.level)
            .finish()
    }
}

/// Outcome recorded for an evaluated check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintStatus {
    Ok,
    NotOk,
    Information,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainEntry {
    /// The question the check answers.
    pub message: MessageTag,
    pub status: ConstraintStatus,
    /// The error tag, present unless the check passed.
    pub answer: Option<MessageTag>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainResult {
    title: String,
    conclusion: Conclusion,
    entries: Vec<ChainEntry>,
}

impl ChainResult {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn conclusion(&self) -> &Conclusion {
        &self.conclusion
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    pub fn is_passed(&self) -> bool {
        self.conclusion.is_passed()
    }
}

pub struct Chain<'a> {
    title: String,
    default_failure: FailureIndication,
    checks: Vec<Check<'a>>,
}

impl<'a> Chain<'a> {
    /// New chain whose checks fail with `FAILED` and no sub-indication unless overridden.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            default_failure: FailureIndication::default(),
            checks: Vec::new(),
        }
    }

    /// Failure outcome for checks that do not declare their own.
    pub fn with_default_failure(mut self, failure: FailureIndication) -> Self {
        self.default_failure = failure;
        self
    }

    pub fn then(mut self, check: Check<'a>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn push(&mut self, check: Check<'a>) {
        self.checks.push(check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn execute(self) -> ChainResult {
        let mut conclusion = Conclusion::passed();
        let mut entries = Vec::new();

        for check in self.checks {
            if !check.level.is_evaluated() {
                trace!(chain = %self.title, check = check.message.id, "check ignored");
                continue;
            }

            let passed = (check.predicate)();
            trace!(chain = %self.title, check = check.message.id, passed, "check evaluated");
            if passed {
                entries.push(ChainEntry {
                    message: check.message,
                    status: ConstraintStatus::Ok,
                    answer: None,
                    additional_info: None,
                });
                continue;
            }

            let additional_info = check.additional_info.as_ref().and_then(|info| info());
            let reported = Message {
                tag: check.error,
                additional_info: additional_info.clone(),
            };
            let status = match check.level {
                LevelConstraint::Inform => {
                    conclusion.inform(reported);
                    ConstraintStatus::Information
                }
                LevelConstraint::Warn => {
                    conclusion.warn(reported);
                    ConstraintStatus::Warning
                }
                _ => {
                    let failure = check.failure.unwrap_or(self.default_failure);
                    debug!(
                        chain = %self.title,
                        check = check.message.id,
                        indication = %failure.indication(),
                        "chain stopped on failed check"
                    );
                    conclusion.fail(failure, reported);
                    entries.push(ChainEntry {
                        message: check.message,
                        status: ConstraintStatus::NotOk,
                        answer: Some(check.error),
                        additional_info,
                    });
                    break;
                }
            };
            debug!(chain = %self.title, check = check.message.id, ?status, "soft check failure");
            entries.push(ChainEntry {
                message: check.message,
                status,
                answer: Some(check.error),
                additional_info,
            });
        }

        ChainResult {
            title: self.title,
            conclusion,
            entries,
        }
    }
}
