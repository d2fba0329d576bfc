// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::Serialize;

use crate::indication::{Indication, SubIndication};
use crate::message::MessageTag;

/// Non-passed outcome applied when a FAIL-level check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureIndication {
    indication: Indication,
    sub_indication: Option<SubIndication>,
}

impl FailureIndication {
    pub fn failed(sub_indication: Option<SubIndication>) -> Self {
        Self {
            indication: Indication::Failed,
            sub_indication,
        }
    }

    pub fn indeterminate(sub_indication: SubIndication) -> Self {
        Self {
            indication: Indication::Indeterminate,
            sub_indication: Some(sub_indication),
        }
    }

    /// `None` for [`Indication::Passed`], which is not a failure.
    pub fn new(indication: Indication, sub_indication: Option<SubIndication>) -> Option<Self> {
        match indication {
            Indication::Passed => None,
            _ => Some(Self {
                indication,
                sub_indication,
            }),
        }
    }

    pub fn indication(&self) -> Indication {
        self.indication
    }

    pub fn sub_indication(&self) -> Option<SubIndication> {
        self.sub_indication
    }
}

impl Default for FailureIndication {
    fn default() -> Self {
        Self::failed(None)
    }
}

/// Reported message: a tag plus optional details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub tag: MessageTag,
    pub additional_info: Option<String>,
}

/// Verdict of a chain with the messages collected while executing it.
///
/// A passed conclusion never carries a sub-indication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conclusion {
    indication: Indication,
    sub_indication: Option<SubIndication>,
    errors: Vec<Message>,
    warnings: Vec<Message>,
    infos: Vec<Message>,
}

impl Conclusion {
    pub(crate) fn passed() -> Self {
        Self {
            indication: Indication::Passed,
            sub_indication: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            infos: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, failure: FailureIndication, error: Message) {
        self.indication = failure.indication;
        self.sub_indication = failure.sub_indication;
        self.errors.push(error);
    }

    pub(crate) fn warn(&mut self, warning: Message) {
        self.warnings.push(warning);
    }

    pub(crate) fn inform(&mut self, info: Message) {
        self.infos.push(info);
    }

    pub fn indication(&self) -> Indication {
        self.indication
    }

    pub fn sub_indication(&self) -> Option<SubIndication> {
        self.sub_indication
    }

    pub fn is_passed(&self) -> bool {
        self.indication == Indication::Passed
    }

    /// The failure this conclusion represents, `None` when passed.
    pub fn failure(&self) -> Option<FailureIndication> {
        FailureIndication::new(self.indication, self.sub_indication)
    }

    pub fn errors(&self) -> &[Message] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Message] {
        &self.warnings
    }

    pub fn infos(&self) -> &[Message] {
        &self.infos
    }
}
