//! Phone Number Normalization

use phonenumber::country;
use phonenumber::Mode;

use crate::ChannelError;

/// Format a stored number in E.164, interpreting national numbers in `country_code`
pub fn to_e164(number: &str, country_code: &str) -> Result<String, ChannelError> {
    let region: country::Id = country_code
        .trim()
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| ChannelError::InvalidPhoneNumber(format!("unknown country code {}", country_code)))?;

    let parsed = phonenumber::parse(Some(region), number)
        .map_err(|e| ChannelError::InvalidPhoneNumber(format!("{}: {}", number, e)))?;

    if !phonenumber::is_valid(&parsed) {
        return Err(ChannelError::InvalidPhoneNumber(format!(
            "{} is not a valid number for {}",
            number, country_code
        )));
    }

    Ok(parsed.format().mode(Mode::E164).to_string())
}
