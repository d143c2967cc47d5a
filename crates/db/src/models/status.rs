//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data in the
//! corresponding `*_statuses` table, and `name()` matches its `name` column.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Lookup-table name, as exposed over the API.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            /// Resolve a database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Name for a raw status ID, or `"unknown"` when it is not seeded.
            pub fn name_of(id: StatusId) -> &'static str {
                Self::from_id(id).map_or("unknown", Self::name)
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Provider payment status. Moves forward only.
    PaymentStatus {
        Pending = 1 => "pending",
        Completed = 2 => "completed",
        Refunded = 3 => "refunded",
    }
}

define_status_enum! {
    /// Booking lifecycle status.
    BookingStatus {
        Pending = 1 => "pending",
        Confirmed = 2 => "confirmed",
        Cancelled = 3 => "cancelled",
    }
}

define_status_enum! {
    /// Whether a booking has been paid for.
    BookingPaymentStatus {
        Unpaid = 1 => "unpaid",
        Paid = 2 => "paid",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_seed_order() {
        assert_eq!(PaymentStatus::Pending.id(), 1);
        assert_eq!(PaymentStatus::Completed.id(), 2);
        assert_eq!(BookingStatus::Confirmed.id(), 2);
        assert_eq!(BookingPaymentStatus::Paid.id(), 2);
    }

    #[test]
    fn from_id_round_trips() {
        assert_eq!(PaymentStatus::from_id(3), Some(PaymentStatus::Refunded));
        assert_eq!(BookingPaymentStatus::from_id(9), None);
    }

    #[test]
    fn name_of_falls_back_to_unknown() {
        assert_eq!(PaymentStatus::name_of(2), "completed");
        assert_eq!(BookingStatus::name_of(42), "unknown");
    }
}
