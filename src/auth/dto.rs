use serde::{Deserialize, Deserializer, Serialize};

/// Request body for user registration. Missing fields deserialize as empty
/// strings so they are reported by field validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(deserialize_with = "phone_string")]
    pub phone: String,
    pub password: String,
    pub role: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "phone_string")]
    pub phone: String,
    pub password: String,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Clients send the phone either as text or as a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum PhoneValue {
    Text(String),
    Number(u64),
}

impl From<PhoneValue> for String {
    fn from(v: PhoneValue) -> Self {
        match v {
            PhoneValue::Text(s) => s,
            PhoneValue::Number(n) => n.to_string(),
        }
    }
}

pub(crate) fn phone_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    PhoneValue::deserialize(d).map(Into::into)
}

pub(crate) fn optional_phone_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<PhoneValue>::deserialize(d).map(|v| v.map(Into::into))
}
