// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// Role a timestamp plays in an advanced electronic signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampType {
    /// Over the signed content, before signing.
    ContentTimestamp,
    AllDataObjectsTimestamp,
    IndividualDataObjectsTimestamp,
    /// Over the signature value.
    SignatureTimestamp,
    /// Over the validation data references only.
    ValidationDataReferencesOnlyTimestamp,
    /// Over the signature and its validation data references.
    ValidationDataTimestamp,
    ArchiveTimestamp,
    /// Document-level timestamp (PDF document timestamps).
    DocumentTimestamp,
}

impl TimestampType {
    pub fn is_content_timestamp(&self) -> bool {
        matches!(
            self,
            Self::ContentTimestamp | Self::AllDataObjectsTimestamp | Self::IndividualDataObjectsTimestamp
        )
    }

    pub fn is_signature_timestamp(&self) -> bool {
        matches!(self, Self::SignatureTimestamp)
    }

    pub fn is_validation_data_timestamp(&self) -> bool {
        matches!(
            self,
            Self::ValidationDataReferencesOnlyTimestamp | Self::ValidationDataTimestamp
        )
    }

    pub fn is_archival_timestamp(&self) -> bool {
        matches!(self, Self::ArchiveTimestamp)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ContentTimestamp => "CONTENT_TIMESTAMP",
            Self::AllDataObjectsTimestamp => "ALL_DATA_OBJECTS_TIMESTAMP",
            Self::IndividualDataObjectsTimestamp => "INDIVIDUAL_DATA_OBJECTS_TIMESTAMP",
            Self::SignatureTimestamp => "SIGNATURE_TIMESTAMP",
            Self::ValidationDataReferencesOnlyTimestamp => "VALIDATION_DATA_REFSONLY_TIMESTAMP",
            Self::ValidationDataTimestamp => "VALIDATION_DATA_TIMESTAMP",
            Self::ArchiveTimestamp => "ARCHIVE_TIMESTAMP",
            Self::DocumentTimestamp => "DOCUMENT_TIMESTAMP",
        }
    }
}

impl fmt::Display for TimestampType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
