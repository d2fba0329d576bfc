// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Object identifiers used by timestamp tokens and their CAdES attributes.

pub const SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
pub const TST_INFO: &str = "1.2.840.113549.1.9.16.1.4";

pub const ATTR_CONTENT_TYPE: &str = "1.2.840.113549.1.9.3";
pub const ATTR_MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";
pub const ATTR_SIGNING_CERTIFICATE: &str = "1.2.840.113549.1.9.16.2.12";
pub const ATTR_SIGNING_CERTIFICATE_V2: &str = "1.2.840.113549.1.9.16.2.47";
pub const ATTR_COMPLETE_CERTIFICATE_REFS: &str = "1.2.840.113549.1.9.16.2.21";
pub const ATTR_COMPLETE_REVOCATION_REFS: &str = "1.2.840.113549.1.9.16.2.22";
pub const ATTR_CERT_VALUES: &str = "1.2.840.113549.1.9.16.2.23";
pub const ATTR_REVOCATION_VALUES: &str = "1.2.840.113549.1.9.16.2.24";

pub const RI_OCSP_RESPONSE: &str = "1.3.6.1.5.5.7.16.2";
pub const OCSP_BASIC: &str = "1.3.6.1.5.5.7.48.1.1";

pub const SHA1: &str = "1.3.14.3.2.26";
pub const SHA224: &str = "2.16.840.1.101.3.4.2.4";
pub const SHA256: &str = "2.16.840.1.101.3.4.2.1";
pub const SHA384: &str = "2.16.840.1.101.3.4.2.2";
pub const SHA512: &str = "2.16.840.1.101.3.4.2.3";
pub const SHA3_256: &str = "2.16.840.1.101.3.4.2.8";
pub const SHA3_384: &str = "2.16.840.1.101.3.4.2.9";
pub const SHA3_512: &str = "2.16.840.1.101.3.4.2.10";

pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
pub const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
pub const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
pub const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
pub const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
pub const SHA224_WITH_RSA: &str = "1.2.840.113549.1.1.14";
pub const RSASSA_PSS: &str = "1.2.840.113549.1.1.10";
pub const MGF1: &str = "1.2.840.113549.1.1.8";
pub const SHA3_256_WITH_RSA: &str = "2.16.840.1.101.3.4.3.14";
pub const SHA3_384_WITH_RSA: &str = "2.16.840.1.101.3.4.3.15";
pub const SHA3_512_WITH_RSA: &str = "2.16.840.1.101.3.4.3.16";

pub const EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
pub const ECDSA_WITH_SHA1: &str = "1.2.840.10045.4.1";
pub const ECDSA_WITH_SHA224: &str = "1.2.840.10045.4.3.1";
pub const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
pub const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
pub const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
pub const ECDSA_WITH_SHA3_256: &str = "2.16.840.1.101.3.4.3.10";
pub const ECDSA_WITH_SHA3_384: &str = "2.16.840.1.101.3.4.3.11";
pub const ECDSA_WITH_SHA3_512: &str = "2.16.840.1.101.3.4.3.12";

pub const CURVE_P256: &str = "1.2.840.10045.3.1.7";
pub const CURVE_P384: &str = "1.3.132.0.34";

pub const ED25519: &str = "1.3.101.112";
