use crate::error::{CrmError, RowError};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// A row shape the loader knows how to parse.
pub trait Record: DeserializeOwned {
    /// Number of fields a well-formed row carries.
    const FIELDS: usize;

    fn id(&self) -> u32;

    /// Range checks that a successful parse cannot express.
    fn validate(&self) -> Result<(), RowError> {
        if self.id() == 0 {
            return Err(RowError::OutOfRange("id must be at least 1"));
        }
        Ok(())
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, CrmError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| CrmError::InvalidDate(value.trim().to_string()))
}

/// Lenient boolean: anything outside the truthy set is false.
pub fn parse_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "t" | "yes" | "y" | "si" | "sí"
    )
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

mod date_field {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(de::Error::custom)
    }
}

fn truthy_field<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(parse_truthy(&String::deserialize(deserializer)?))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Client {
    pub id: u32,
    pub name: String,
    pub email: String,
    #[serde(deserialize_with = "date_field::deserialize")]
    pub signup_date: NaiveDate,
    #[serde(deserialize_with = "truthy_field")]
    pub active: bool,
}

impl Client {
    pub fn age_in_days(&self, today: NaiveDate) -> i64 {
        (today - self.signup_date).num_days()
    }
}

impl Record for Client {
    const FIELDS: usize = 5;

    fn id(&self) -> u32 {
        self.id
    }
}

// Column names double as the header written to clientes.csv.
impl Serialize for Client {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Client", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("nombre", &self.name)?;
        state.serialize_field("email", &self.email)?;
        state.serialize_field(
            "fecha_alta",
            &self.signup_date.format(DATE_FORMAT).to_string(),
        )?;
        state.serialize_field("activo", &u8::from(self.active))?;
        state.end()
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.active { "active" } else { "inactive" };
        write!(
            f,
            "[{}] {} <{}> | signed up {} | {}",
            self.id, self.name, self.email, self.signup_date, status
        )
    }
}

/// Unvalidated client input as typed by a user.
#[derive(Debug, Clone, Default)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub signup_date: String,
    pub active: String,
}

impl ClientDraft {
    pub fn into_client(self, id: u32) -> Result<Client, CrmError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CrmError::EmptyName);
        }
        let email = self.email.trim().to_string();
        if !is_valid_email(&email) {
            return Err(CrmError::InvalidEmail(email));
        }
        Ok(Client {
            id,
            name,
            email,
            signup_date: parse_date(&self.signup_date)?,
            active: parse_truthy(&self.active),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    pub id: u32,
    pub name: String,
    pub category: String,
    #[serde(deserialize_with = "date_field::deserialize")]
    pub event_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

impl Event {
    /// Negative once the event has passed.
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (self.event_date - today).num_days()
    }
}

impl Record for Event {
    const FIELDS: usize = 5;

    fn id(&self) -> u32 {
        self.id
    }

    fn validate(&self) -> Result<(), RowError> {
        if self.id == 0 {
            return Err(RowError::OutOfRange("id must be at least 1"));
        }
        if self.price < Decimal::ZERO {
            return Err(RowError::OutOfRange("price must not be negative"));
        }
        Ok(())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) | {} | {:.2}",
            self.id,
            self.name,
            self.category,
            self.event_date,
            self.price.round_dp(2)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sale {
    pub id: u32,
    pub client_id: u32,
    pub event_id: u32,
    #[serde(deserialize_with = "date_field::deserialize")]
    pub sale_date: NaiveDate,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
}

impl Sale {
    pub fn total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

impl Record for Sale {
    const FIELDS: usize = 6;

    fn id(&self) -> u32 {
        self.id
    }

    fn validate(&self) -> Result<(), RowError> {
        if self.id == 0 {
            return Err(RowError::OutOfRange("id must be at least 1"));
        }
        if self.quantity == 0 {
            return Err(RowError::OutOfRange("quantity must be positive"));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(RowError::OutOfRange("unit price must not be negative"));
        }
        if Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .is_none()
        {
            return Err(RowError::OutOfRange("sale total is too large"));
        }
        Ok(())
    }
}

impl fmt::Display for Sale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] C{} -> E{} | {} | qty={} | {:.2} (total {:.2})",
            self.id,
            self.client_id,
            self.event_id,
            self.sale_date,
            self.quantity,
            self.unit_price.round_dp(2),
            self.total().round_dp(2)
        )
    }
}

#[cfg(test)]
use rust_decimal_macros::dec;

#[cfg(test)]
fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
}

#[test]
fn truthy_strings() {
    for value in ["1", "true", "T", " yes ", "y", "Si", "sí"] {
        assert!(parse_truthy(value), "{value} should be truthy");
    }
    for value in ["0", "false", "no", "", "2"] {
        assert!(!parse_truthy(value), "{value} should be falsy");
    }
}

#[test]
fn derived_day_counts() {
    let today = date("2024-03-10");
    let client = Client {
        id: 1,
        name: "Ana".into(),
        email: "ana@example.com".into(),
        signup_date: date("2024-03-01"),
        active: true,
    };
    assert_eq!(client.age_in_days(today), 9);

    let past = Event {
        id: 1,
        name: "Expo".into(),
        category: "Fair".into(),
        event_date: date("2024-03-08"),
        price: dec!(10),
    };
    assert_eq!(past.days_until(today), -2);
}

#[test]
fn sale_total_multiplies_quantity() {
    let sale = Sale {
        id: 1,
        client_id: 1,
        event_id: 1,
        sale_date: date("2024-03-01"),
        quantity: 3,
        unit_price: dec!(12.50),
    };
    assert_eq!(sale.total(), dec!(37.50));
    assert_eq!(
        sale.to_string(),
        "[1] C1 -> E1 | 2024-03-01 | qty=3 | 12.50 (total 37.50)"
    );
}

#[test]
fn listings_round_to_two_places() {
    let sale = Sale {
        id: 2,
        client_id: 1,
        event_id: 1,
        sale_date: date("2024-03-01"),
        quantity: 3,
        unit_price: dec!(3.333),
    };
    assert_eq!(
        sale.to_string(),
        "[2] C1 -> E1 | 2024-03-01 | qty=3 | 3.33 (total 10.00)"
    );

    let event = Event {
        id: 1,
        name: "Expo".into(),
        category: "Fair".into(),
        event_date: date("2024-03-08"),
        price: dec!(12.349),
    };
    assert_eq!(event.to_string(), "[1] Expo (Fair) | 2024-03-08 | 12.35");
}

#[test]
fn draft_validation() {
    let draft = ClientDraft {
        name: " Ana ".into(),
        email: "ana@example.com".into(),
        signup_date: "2024-01-31".into(),
        active: "si".into(),
    };
    let client = draft.clone().into_client(4).unwrap();
    assert_eq!(client.id, 4);
    assert_eq!(client.name, "Ana");
    assert_eq!(client.signup_date, date("2024-01-31"));
    assert!(client.active);

    let bad_email = ClientDraft {
        email: "ana@example".into(),
        ..draft.clone()
    };
    assert!(matches!(
        bad_email.into_client(4),
        Err(CrmError::InvalidEmail(_))
    ));

    let bad_date = ClientDraft {
        signup_date: "31/01/2024".into(),
        ..draft.clone()
    };
    assert!(matches!(bad_date.into_client(4), Err(CrmError::InvalidDate(_))));

    let no_name = ClientDraft {
        name: "   ".into(),
        ..draft
    };
    assert!(matches!(no_name.into_client(4), Err(CrmError::EmptyName)));
}
