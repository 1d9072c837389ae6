use std::collections::BTreeSet;
use std::fmt;

/// The security status of a single classified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
	/// Nobody in view.
	NoSubject,

	/// At least one recognized face and no confirmed intrusion.
	KnownSubject { names: BTreeSet<String> },

	/// A body or an unknown face, not yet seen for long enough to confirm.
	UnidentifiedBody,

	/// Unknown presence for at least the streak limit of consecutive frames.
	ConfirmedIntruder,
}

/// The display ordering of [Status].
///
/// Only used for presentation; the classifier never compares severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
	Clear,
	Safe,
	Suspicious,
	Alarm,
}

impl Status {
	pub fn known<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::KnownSubject {
			names: names.into_iter().map(Into::into).collect(),
		}
	}

	pub fn severity(&self) -> Severity {
		match self {
			Self::NoSubject => Severity::Clear,
			Self::KnownSubject { .. } => Severity::Safe,
			Self::UnidentifiedBody => Severity::Suspicious,
			Self::ConfirmedIntruder => Severity::Alarm,
		}
	}

	/// Whether this status triggers evidence capture and a notification.
	pub fn is_alert(&self) -> bool {
		matches!(self, Self::UnidentifiedBody | Self::ConfirmedIntruder)
	}

	/// The status line drawn along the bottom of the frame.
	pub fn label(&self) -> String {
		match self {
			Self::NoSubject => "NO PERSON".to_string(),
			Self::KnownSubject { names } => {
				let names: Vec<&str> = names.iter().map(String::as_str).collect();
				format!("KNOWN: {}", names.join(", "))
			}
			Self::UnidentifiedBody => "INTRUDER (Body only)".to_string(),
			Self::ConfirmedIntruder => "INTRUDER (Unknown / body)".to_string(),
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.label())
	}
}
