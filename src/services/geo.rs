//! Free-text country name to ISO 3166-1 alpha-2 translation for shipping
//! pre-fill. Membership custom fields store whatever the member typed, so
//! lookup is case-insensitive and unknown names simply yield no code.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static COUNTRY_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("argentina", "AR"),
        ("australia", "AU"),
        ("austria", "AT"),
        ("belgium", "BE"),
        ("brazil", "BR"),
        ("bulgaria", "BG"),
        ("canada", "CA"),
        ("chile", "CL"),
        ("china", "CN"),
        ("colombia", "CO"),
        ("croatia", "HR"),
        ("czech republic", "CZ"),
        ("czechia", "CZ"),
        ("denmark", "DK"),
        ("estonia", "EE"),
        ("finland", "FI"),
        ("france", "FR"),
        ("germany", "DE"),
        ("greece", "GR"),
        ("hong kong", "HK"),
        ("hungary", "HU"),
        ("iceland", "IS"),
        ("india", "IN"),
        ("indonesia", "ID"),
        ("ireland", "IE"),
        ("israel", "IL"),
        ("italy", "IT"),
        ("japan", "JP"),
        ("latvia", "LV"),
        ("lithuania", "LT"),
        ("luxembourg", "LU"),
        ("malaysia", "MY"),
        ("mexico", "MX"),
        ("netherlands", "NL"),
        ("the netherlands", "NL"),
        ("new zealand", "NZ"),
        ("norway", "NO"),
        ("peru", "PE"),
        ("philippines", "PH"),
        ("poland", "PL"),
        ("portugal", "PT"),
        ("romania", "RO"),
        ("singapore", "SG"),
        ("slovakia", "SK"),
        ("slovenia", "SI"),
        ("south africa", "ZA"),
        ("south korea", "KR"),
        ("spain", "ES"),
        ("sweden", "SE"),
        ("switzerland", "CH"),
        ("taiwan", "TW"),
        ("thailand", "TH"),
        ("turkey", "TR"),
        ("ukraine", "UA"),
        ("united arab emirates", "AE"),
        ("united kingdom", "GB"),
        ("great britain", "GB"),
        ("uk", "GB"),
        ("united states", "US"),
        ("united states of america", "US"),
        ("usa", "US"),
        ("vietnam", "VN"),
    ])
});

/// Translate a free-text country name to its alpha-2 code.
pub fn country_code(name: &str) -> Option<&'static str> {
    COUNTRY_CODES
        .get(name.trim().to_lowercase().as_str())
        .copied()
}
