//! Closed key enumerations for every string-keyed lookup the cost
//! model uses.
//!
//! RULE: Records and plans carry free-form tokens ("vct", "5x_week").
//! Tokens are parsed ONCE, at the edge, into one of these enums.
//! An unrecognised token becomes `Other`, which every lookup treats
//! as the neutral default. No lookup in the engine branches on raw
//! strings.

/// Generates a token enum with an `Other` fallback variant.
///
/// Each variant lists its canonical token first, then any aliases.
/// Serde goes through `String`, so tokens round-trip as plain JSON
/// strings (and as JSON map keys).
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $token:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// Any token not listed above.
            Other,
        }

        impl $name {
            /// Every variant except `Other`, in declaration order.
            pub const KNOWN: &'static [$name] = &[$($name::$variant),+];

            /// Parse a token, case-insensitively. Never fails.
            pub fn parse(token: &str) -> Self {
                let normalized = token.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    $($token $(| $alias)* => $name::$variant,)+
                    _ => $name::Other,
                }
            }

            /// The canonical token.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                    $name::Other => "other",
                }
            }
        }

        impl $crate::keys::TokenKey for $name {
            fn is_other(&self) -> bool {
                matches!(self, $name::Other)
            }
        }

        impl From<String> for $name {
            fn from(token: String) -> Self {
                Self::parse(&token)
            }
        }

        impl From<&str> for $name {
            fn from(token: &str) -> Self {
                Self::parse(token)
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> String {
                key.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use token_enum;

/// Implemented by every generated token enum.
pub trait TokenKey: Copy + Ord {
    fn is_other(&self) -> bool;
}

token_enum! {
    /// Floor surface of an area.
    FloorType {
        Vct      => "vct",
        Carpet   => "carpet",
        Hardwood => "hardwood" | "wood",
        Tile     => "tile" | "ceramic_tile",
        Concrete => "concrete" | "sealed_concrete",
        Vinyl    => "vinyl" | "lvt",
        Laminate => "laminate",
        Marble   => "marble",
        Terrazzo => "terrazzo",
        Epoxy    => "epoxy",
        Rubber   => "rubber",
    }
}

token_enum! {
    /// How dirty an area typically is when the crew arrives.
    ConditionLevel {
        Light     => "light" | "excellent",
        Standard  => "standard" | "good",
        Medium    => "medium" | "fair",
        Heavy     => "heavy" | "poor",
        Difficult => "difficult",
    }
}

token_enum! {
    /// Foot traffic through an area.
    TrafficLevel {
        Low      => "low",
        Medium   => "medium",
        High     => "high",
        VeryHigh => "very_high",
    }
}

token_enum! {
    /// Building-level classification of a facility.
    BuildingType {
        Office      => "office",
        Medical     => "medical" | "healthcare",
        Industrial  => "industrial" | "manufacturing",
        Retail      => "retail",
        Educational => "educational" | "school",
        Warehouse   => "warehouse",
        Residential => "residential",
        Restaurant  => "restaurant",
        Government  => "government",
    }
}

token_enum! {
    /// Requested task complexity for a quote; drives the add-on table.
    TaskComplexity {
        Standard     => "standard",
        Sanitization => "sanitization",
        FloorCare    => "floor_care",
        DeepClean    => "deep_clean",
        HighSecurity => "high_security",
        Biohazard    => "biohazard",
    }
}
