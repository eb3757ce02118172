use crosstab_core::error::CrosstabError;
use crosstab_core::Conversion;

pub fn render(conversion: &Conversion) -> Result<String, CrosstabError> {
    Ok(serde_json::to_string_pretty(conversion)?)
}
