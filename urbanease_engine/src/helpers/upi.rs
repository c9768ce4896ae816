use ue_common::{Paise, RUPEE_CURRENCY_CODE};
use url::form_urlencoded;

pub const DEFAULT_UPI_VPA: &str = "urbanease@upi";
pub const DEFAULT_UPI_NAME: &str = "UrbanEase";
/// UPI apps truncate or reject longer transaction notes.
pub const MAX_UPI_NOTE_LENGTH: usize = 40;

/// The merchant account that customers pay into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpiPayee {
    pub vpa: String,
    pub name: String,
}

impl Default for UpiPayee {
    fn default() -> Self {
        Self { vpa: DEFAULT_UPI_VPA.to_string(), name: DEFAULT_UPI_NAME.to_string() }
    }
}

/// Builds a `upi://pay` deep link that UPI apps understand.
///
/// Query values are percent-encoded, with spaces encoded as `%20` rather than `+`, since not every UPI app decodes
/// form-style pluses.
pub fn upi_pay_uri(payee: &UpiPayee, amount: Paise, note: &str) -> String {
    let note = note.chars().take(MAX_UPI_NOTE_LENGTH).collect::<String>();
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("pa", &payee.vpa)
        .append_pair("pn", &payee.name)
        .append_pair("am", &amount.to_rupee_string())
        .append_pair("cu", RUPEE_CURRENCY_CODE)
        .append_pair("tn", &note)
        .finish()
        .replace('+', "%20");
    format!("upi://pay?{query}")
}
