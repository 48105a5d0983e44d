use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // local-part @ domain . suffix, with exactly one '@'
    static ref ADDRESS_SHAPE: Regex = Regex::new(r"^[^@]+@[^@]+\.[^@]+$").unwrap();
}

/// Outcome of the advisory address-shape check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressShape {
    Valid,
    Invalid,
}

impl AddressShape {
    pub fn is_valid(self) -> bool {
        matches!(self, AddressShape::Valid)
    }

    /// Style marker applied to the input field.
    pub fn css_class(self) -> &'static str {
        match self {
            AddressShape::Valid => "valid",
            AddressShape::Invalid => "invalid",
        }
    }
}

/// Form fields the user can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Sender,
    Recipient,
    Body,
}

impl FormField {
    pub fn name(self) -> &'static str {
        match self {
            FormField::Sender => "sender",
            FormField::Recipient => "recipient",
            FormField::Body => "body",
        }
    }
}

/// Classify a candidate address. Whitespace is significant.
pub fn classify(text: &str) -> AddressShape {
    if ADDRESS_SHAPE.is_match(text) {
        AddressShape::Valid
    } else {
        AddressShape::Invalid
    }
}

pub struct FieldValidator;

impl FieldValidator {
    /// Hint for an input-change event, or `None` for fields that carry no
    /// address (the message body).
    pub fn hint_for(field: FormField, text: &str) -> Option<AddressShape> {
        match field {
            FormField::Sender | FormField::Recipient => Some(classify(text)),
            FormField::Body => None,
        }
    }
}
