//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

/// Fulfillment (lifecycle) state of an order, independent of payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.fulfillment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Role of a store user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    User,
    /// Store administrator with access to the admin API.
    Admin,
}

impl UserRole {
    /// Whether this role may use the admin API.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// What a one-time passcode was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.otp_purpose", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    #[default]
    Login,
    Signup,
}

macro_rules! impl_str_conversions {
    ($ty:ty, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// The canonical lowercase name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $label, ": {}"), s)),
                }
            }
        }
    };
}

impl_str_conversions!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
});

impl_str_conversions!(FulfillmentStatus, "order status", {
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl_str_conversions!(UserRole, "role", {
    User => "user",
    Admin => "admin",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(FulfillmentStatus::default(), FulfillmentStatus::Processing);
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_fulfillment_status_parse_and_display() {
        for status in [
            FulfillmentStatus::Processing,
            FulfillmentStatus::Shipped,
            FulfillmentStatus::Delivered,
            FulfillmentStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<FulfillmentStatus>(), Ok(status));
        }
        assert!("returned".parse::<FulfillmentStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).unwrap(),
            "\"paid\""
        );
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert!(role.is_admin());
    }
}
