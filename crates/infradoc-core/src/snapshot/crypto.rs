//! IPsec tunnel parameter assessment

use super::model::TunnelData;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SUPPORTED_PARAMS_URL: &str =
    "https://docs.oracle.com/en-us/iaas/Content/Network/Reference/supportedIPsecparams.htm";

const P1_ENCRYPTION: &str = "AES_256_CBC";
const P1_AUTHENTICATION: &str = "SHA2_384";
const P1_DH_GROUP: &str = "GROUP20";

const P2_GCM: &str = "AES_256_GCM";
const P2_CBC: &str = "AES_256_CBC";
const P2_CBC_AUTHENTICATION: &str = "HMAC_SHA2_256_128";

/// How a tunnel's crypto settings compare to the provider recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoAssessment {
    /// Phase 1 left on provider defaults
    OracleManaged,
    Recommended,
    NotRecommended,
    /// Phase 1 or phase 2 details were not collected
    Unavailable,
}

impl CryptoAssessment {
    /// Where to read about supported parameters, when it matters
    pub fn reference_url(&self) -> Option<&'static str> {
        match self {
            CryptoAssessment::NotRecommended => Some(SUPPORTED_PARAMS_URL),
            _ => None,
        }
    }
}

impl fmt::Display for CryptoAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoAssessment::OracleManaged => write!(f, "oracle-managed"),
            CryptoAssessment::Recommended => write!(f, "recommended"),
            CryptoAssessment::NotRecommended => write!(f, "not recommended"),
            CryptoAssessment::Unavailable => write!(f, "unavailable"),
        }
    }
}

pub fn assess_tunnel(tunnel: &TunnelData) -> CryptoAssessment {
    let (Some(p1), Some(p2)) = (&tunnel.phase_one_details, &tunnel.phase_two_details) else {
        return CryptoAssessment::Unavailable;
    };

    if !p1.is_custom {
        return CryptoAssessment::OracleManaged;
    }

    let p1_ok = p1.encryption_algorithm == P1_ENCRYPTION
        && p1.authentication_algorithm == P1_AUTHENTICATION
        && p1.dh_group == P1_DH_GROUP;

    // GCM carries its own integrity check, so no separate authentication.
    let p2_ok = match p2.encryption_algorithm.as_str() {
        P2_GCM => p2.authentication_algorithm.is_none(),
        P2_CBC => p2.authentication_algorithm.as_deref() == Some(P2_CBC_AUTHENTICATION),
        _ => false,
    };

    if p1_ok && p2_ok {
        CryptoAssessment::Recommended
    } else {
        CryptoAssessment::NotRecommended
    }
}
