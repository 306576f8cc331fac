use serde::{Deserialize, Serialize};

/// Stable identifier of a charging network.
///
/// Used only as a ledger/history key. Human-facing names and icons live in
/// [`crate::catalog`], so nothing in the domain depends on display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    AstorSarj,
    Esarj,
    Otojet,
    SarjSepeti,
    Voltrun,
    WatMobilite,
    #[serde(rename = "chargemate")]
    ChargeMate,
    #[serde(rename = "gioev")]
    GioEv,
    #[serde(rename = "plugshare")]
    PlugShare,
    Trugo,
    Zes,
    #[serde(rename = "enyakit")]
    EnYakit,
    Hizzlan,
    #[serde(rename = "qcharge")]
    QCharge,
    Voltla,
    Oncharge,
}

impl ProviderId {
    pub const ALL: [ProviderId; 16] = [
        ProviderId::AstorSarj,
        ProviderId::Esarj,
        ProviderId::Otojet,
        ProviderId::SarjSepeti,
        ProviderId::Voltrun,
        ProviderId::WatMobilite,
        ProviderId::ChargeMate,
        ProviderId::GioEv,
        ProviderId::PlugShare,
        ProviderId::Trugo,
        ProviderId::Zes,
        ProviderId::EnYakit,
        ProviderId::Hizzlan,
        ProviderId::QCharge,
        ProviderId::Voltla,
        ProviderId::Oncharge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::AstorSarj => "astor-sarj",
            ProviderId::Esarj => "esarj",
            ProviderId::Otojet => "otojet",
            ProviderId::SarjSepeti => "sarj-sepeti",
            ProviderId::Voltrun => "voltrun",
            ProviderId::WatMobilite => "wat-mobilite",
            ProviderId::ChargeMate => "chargemate",
            ProviderId::GioEv => "gioev",
            ProviderId::PlugShare => "plugshare",
            ProviderId::Trugo => "trugo",
            ProviderId::Zes => "zes",
            ProviderId::EnYakit => "enyakit",
            ProviderId::Hizzlan => "hizzlan",
            ProviderId::QCharge => "qcharge",
            ProviderId::Voltla => "voltla",
            ProviderId::Oncharge => "oncharge",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = super::LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim().to_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == slug)
            .ok_or_else(|| super::LedgerError::UnknownProvider(s.to_string()))
    }
}
