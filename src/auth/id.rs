//! Strongly typed identifiers for providers, catalog releases, and catalog users.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

macro_rules! def_id {
	($name:ident, $kind:literal, $check:path, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and wraps it.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				Self::try_from(value.as_ref().to_owned())
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$check($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

def_id! {
	ProviderId,
	"Provider",
	check_token,
	"Identifier for an OAuth 1.0a provider descriptor."
}
def_id! {
	ReleaseId,
	"Release",
	check_numeric,
	"Numeric catalog release id used in wantlist paths."
}
def_id! {
	Username,
	"Username",
	check_token,
	"Catalog account name resolved through the identity endpoint."
}

impl From<u64> for ReleaseId {
	fn from(value: u64) -> Self {
		Self(value.to_string())
	}
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Identifier kind (`Provider`, `Release`, `Username`).
		kind: &'static str,
	},
	/// Whitespace anywhere in the value.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Identifier kind.
		kind: &'static str,
	},
	/// A release id contained something other than ASCII digits.
	#[error("{kind} identifier must be numeric.")]
	NotNumeric {
		/// Identifier kind.
		kind: &'static str,
	},
	/// Longer than the permitted number of bytes.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Identifier kind.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

fn check_token(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	if value.is_empty() {
		Err(IdentifierError::Empty { kind })
	} else if value.len() > IDENTIFIER_MAX_LEN {
		Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN })
	} else if value.chars().any(char::is_whitespace) {
		Err(IdentifierError::ContainsWhitespace { kind })
	} else {
		Ok(())
	}
}

fn check_numeric(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	check_token(kind, value)?;

	if value.bytes().all(|b| b.is_ascii_digit()) {
		Ok(())
	} else {
		Err(IdentifierError::NotNumeric { kind })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn release_ids_are_numeric() {
		let release = ReleaseId::new("249504").expect("Release fixture should be valid.");

		assert_eq!(release.as_ref(), "249504");
		assert_eq!(format!("{release:?}"), "Release(249504)");
		assert_eq!(ReleaseId::from(249504), release);
		assert_eq!(ReleaseId::new("r249504"), Err(IdentifierError::NotNumeric { kind: "Release" }));
		assert_eq!(
			ReleaseId::new(" 249504"),
			Err(IdentifierError::ContainsWhitespace { kind: "Release" })
		);
		assert!(ReleaseId::new("7".repeat(IDENTIFIER_MAX_LEN)).is_ok());
		assert!(matches!(
			ReleaseId::new("7".repeat(IDENTIFIER_MAX_LEN + 1)),
			Err(IdentifierError::TooLong { .. })
		));
	}

	#[test]
	fn usernames_reject_any_whitespace() {
		assert!(Username::new("crate digger").is_err());
		assert!(Username::new(format!("crate{}digger", '\u{00A0}')).is_err());
		assert_eq!(Username::new(""), Err(IdentifierError::Empty { kind: "Username" }));
		assert_eq!(
			"rodney.fool-99".parse::<Username>().map(String::from),
			Ok("rodney.fool-99".into())
		);
	}

	#[test]
	fn serde_runs_validation() {
		let username: Username =
			serde_json::from_str("\"rodneyfool\"").expect("Username should deserialize.");

		assert_eq!(username.as_ref(), "rodneyfool");
		assert!(serde_json::from_str::<Username>("\"with space\"").is_err());
		assert!(serde_json::from_str::<ReleaseId>("\"abc\"").is_err());
		assert_eq!(
			serde_json::to_string(&ReleaseId::from(42)).expect("Release should serialize."),
			"\"42\""
		);
	}

	#[test]
	fn lookup_by_str_in_maps() {
		let map: HashMap<ReleaseId, u8> = HashMap::from_iter([(ReleaseId::from(1000), 7)]);

		assert_eq!(map.get("1000"), Some(&7));
	}
}
