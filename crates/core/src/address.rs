//! Saved addresses on a user account.
//!
//! The book holds at most one default address. The first address added is
//! always the default, and removing the default promotes the first remaining
//! address.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{OrderError, ShippingAddress};
use crate::types::AddressId;

/// Errors raised by address book operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("address not found")]
    NotFound,
}

impl From<OrderError> for AddressError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::MissingField(field) => Self::MissingField(field),
        }
    }
}

/// Return the name of the first field whose value is blank.
pub(crate) fn first_blank(fields: &[(&'static str, &str)]) -> Option<&'static str> {
    fields
        .iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
}

/// A saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(flatten)]
    pub details: ShippingAddress,
    pub is_default: bool,
}

/// Input for a new address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[serde(flatten)]
    pub details: ShippingAddress,
    #[serde(default)]
    pub is_default: bool,
}

/// Partial update of an address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

/// A user's saved addresses, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook(Vec<Address>);

impl AddressBook {
    #[must_use]
    pub const fn new(addresses: Vec<Address>) -> Self {
        Self(addresses)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Address] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Address> {
        self.0
    }

    /// The default address, if any.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.0.iter().find(|a| a.is_default)
    }

    /// Add an address and return it.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingField`] if a field is blank.
    pub fn add(&mut self, input: NewAddress) -> Result<Address, AddressError> {
        input.details.validate()?;

        let is_default = input.is_default || self.0.is_empty();
        if is_default {
            self.clear_default();
        }
        let address = Address {
            id: AddressId::generate(),
            details: input.details,
            is_default,
        };
        self.0.push(address.clone());
        Ok(address)
    }

    /// Merge `patch` into the address with `id` and return the result.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotFound`] for an unknown id, or
    /// [`AddressError::MissingField`] if the patch blanks a field.
    pub fn update(&mut self, id: AddressId, patch: AddressPatch) -> Result<Address, AddressError> {
        let index = self.position(id)?;

        let mut details = self.0[index].details.clone();
        merge(&mut details.name, patch.name);
        merge(&mut details.phone, patch.phone);
        merge(&mut details.street, patch.street);
        merge(&mut details.city, patch.city);
        merge(&mut details.state, patch.state);
        merge(&mut details.postal_code, patch.postal_code);
        merge(&mut details.country, patch.country);
        details.validate()?;

        if patch.is_default == Some(true) {
            self.clear_default();
        }
        let address = &mut self.0[index];
        address.details = details;
        if let Some(is_default) = patch.is_default {
            address.is_default = is_default;
        }
        Ok(address.clone())
    }

    /// Remove the address with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotFound`] for an unknown id.
    pub fn remove(&mut self, id: AddressId) -> Result<(), AddressError> {
        let index = self.position(id)?;
        let removed = self.0.remove(index);
        if removed.is_default
            && let Some(first) = self.0.first_mut()
        {
            first.is_default = true;
        }
        Ok(())
    }

    fn position(&self, id: AddressId) -> Result<usize, AddressError> {
        self.0
            .iter()
            .position(|a| a.id == id)
            .ok_or(AddressError::NotFound)
    }

    fn clear_default(&mut self) {
        for address in &mut self.0 {
            address.is_default = false;
        }
    }
}

fn merge(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}
