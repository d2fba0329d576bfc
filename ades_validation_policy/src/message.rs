// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use serde::Serialize;

/// Stable message key with its default English text.
///
/// Every check carries two tags: the question it answers and the answer
/// reported when the check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MessageTag {
    pub id: &'static str,
    pub text: &'static str,
}

impl MessageTag {
    pub const fn new(id: &'static str, text: &'static str) -> Self {
        Self { id, text }
    }

    pub const BBB_XCV_IRDPFC: MessageTag =
        MessageTag::new("BBB_XCV_IRDPFC", "Is the revocation data present for the certificate?");
    pub const BBB_XCV_IRDPFC_ANS: MessageTag =
        MessageTag::new("BBB_XCV_IRDPFC_ANS", "No revocation data found for the certificate!");

    pub const BBB_XCV_IRDPFRC: MessageTag = MessageTag::new(
        "BBB_XCV_IRDPFRC",
        "Is the revocation data present for the revocation issuer certificate?",
    );
    pub const BBB_XCV_IRDPFRC_ANS: MessageTag = MessageTag::new(
        "BBB_XCV_IRDPFRC_ANS",
        "No revocation data found for the revocation issuer certificate!",
    );

    pub const BBB_XCV_REVOC_SELF_ISSUED_OCSP: MessageTag = MessageTag::new(
        "BBB_XCV_REVOC_SELF_ISSUED_OCSP",
        "Is the OCSP response issued by a certificate other than the one it concerns?",
    );
    pub const BBB_XCV_REVOC_SELF_ISSUED_OCSP_ANS: MessageTag = MessageTag::new(
        "BBB_XCV_REVOC_SELF_ISSUED_OCSP_ANS",
        "The OCSP response is self-issued!",
    );

    pub const QUAL_HAS_CONF: MessageTag = MessageTag::new(
        "QUAL_HAS_CONF",
        "Is exactly one certificate qualification determined?",
    );
    pub const QUAL_HAS_CONF_ANS: MessageTag = MessageTag::new(
        "QUAL_HAS_CONF_ANS",
        "Conflicting or missing certificate qualifications!",
    );

    pub const BBB_CV_TSP_IRDOF: MessageTag = MessageTag::new(
        "BBB_CV_TSP_IRDOF",
        "Is the data covered by the timestamp message imprint found?",
    );
    pub const BBB_CV_TSP_IRDOF_ANS: MessageTag = MessageTag::new(
        "BBB_CV_TSP_IRDOF_ANS",
        "The timestamped data is not found!",
    );
    pub const BBB_CV_TSP_IRDOI: MessageTag = MessageTag::new(
        "BBB_CV_TSP_IRDOI",
        "Is the timestamp message imprint intact?",
    );
    pub const BBB_CV_TSP_IRDOI_ANS: MessageTag = MessageTag::new(
        "BBB_CV_TSP_IRDOI_ANS",
        "The timestamp message imprint is not intact!",
    );
    pub const BBB_CV_ISIT: MessageTag =
        MessageTag::new("BBB_CV_ISIT", "Is the timestamp signature intact?");
    pub const BBB_CV_ISIT_ANS: MessageTag =
        MessageTag::new("BBB_CV_ISIT_ANS", "The timestamp signature is not intact!");
    pub const BBB_ICS_ISCI: MessageTag =
        MessageTag::new("BBB_ICS_ISCI", "Is there an identified candidate for the signing certificate?");
    pub const BBB_ICS_ISCI_ANS: MessageTag =
        MessageTag::new("BBB_ICS_ISCI_ANS", "There is no candidate for the signing certificate!");
    pub const BBB_ICS_ICDVV: MessageTag = MessageTag::new(
        "BBB_ICS_ICDVV",
        "Is the signing certificate digest value valid?",
    );
    pub const BBB_ICS_ICDVV_ANS: MessageTag = MessageTag::new(
        "BBB_ICS_ICDVV_ANS",
        "The signing certificate digest value does not match!",
    );

    pub const BBB_XCV_SUB: MessageTag =
        MessageTag::new("BBB_XCV_SUB", "Is the revocation data acceptable?");
    pub const BBB_XCV_SUB_ANS: MessageTag =
        MessageTag::new("BBB_XCV_SUB_ANS", "The revocation data is not acceptable!");
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}
