//! Display metadata for charging providers.
//!
//! The ledger keys balances by [`ProviderId`] only; names and icons shown to
//! users are looked up here by the presentation layer.

use serde::Serialize;

use crate::domain::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub display_name: &'static str,
    /// Asset name of the provider logo
    pub icon: &'static str,
}

pub fn provider_info(id: ProviderId) -> ProviderInfo {
    let (display_name, icon) = match id {
        ProviderId::AstorSarj => ("Astor Şarj", "astor_sarj"),
        ProviderId::Esarj => ("Eşarj", "esarj"),
        ProviderId::Otojet => ("OTOJET", "otojet"),
        ProviderId::SarjSepeti => ("SarjSepeti", "sarj_sepeti"),
        ProviderId::Voltrun => ("Voltrun", "voltrun"),
        ProviderId::WatMobilite => ("wat Mobilite", "wat_mobilite"),
        ProviderId::ChargeMate => ("ChargeMate", "chargemate"),
        ProviderId::GioEv => ("GIOev", "gioev"),
        ProviderId::PlugShare => ("PlugShare", "plugshare"),
        ProviderId::Trugo => ("Trugo", "trugo"),
        ProviderId::Zes => ("Zes", "zes"),
        ProviderId::EnYakit => ("EnYakıt", "enyakit"),
        ProviderId::Hizzlan => ("Hizzlan", "hizzlan"),
        ProviderId::QCharge => ("QCharge", "qcharge"),
        ProviderId::Voltla => ("VOLTLA", "voltla"),
        ProviderId::Oncharge => ("onchage", "oncharge"),
    };
    ProviderInfo {
        id,
        display_name,
        icon,
    }
}

pub fn display_name(id: ProviderId) -> &'static str {
    provider_info(id).display_name
}

/// Every known provider with its display metadata, in identifier order.
pub fn all_providers() -> Vec<ProviderInfo> {
    ProviderId::ALL.into_iter().map(provider_info).collect()
}

/// Resolve either a slug (`astor-sarj`) or a display name (`Astor Şarj`).
pub fn resolve(name: &str) -> Option<ProviderId> {
    if let Ok(id) = name.parse::<ProviderId>() {
        return Some(id);
    }
    let wanted = name.trim().to_lowercase();
    ProviderId::ALL
        .into_iter()
        .find(|id| display_name(*id).to_lowercase() == wanted)
}
