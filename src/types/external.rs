use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Metadata for one currency. Upstreams publish either `{"name": "..."}` or a bare string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyInfo {
    pub name: Option<String>,
}

impl<'de> Deserialize<'de> for CurrencyInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Name(String),
            Object { name: Option<String> },
            Other(serde::de::IgnoredAny),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Name(name) => CurrencyInfo { name: Some(name) },
            Wire::Object { name } => CurrencyInfo { name },
            Wire::Other(_) => CurrencyInfo::default(),
        })
    }
}

/// Currency code → metadata, in the upstream document's key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyCatalog(pub Vec<(String, CurrencyInfo)>);

impl CurrencyCatalog {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurrencyInfo)> {
        self.0.iter().map(|(code, info)| (code.as_str(), info))
    }
}

impl<I: Into<String>> FromIterator<(I, CurrencyInfo)> for CurrencyCatalog {
    fn from_iter<T: IntoIterator<Item = (I, CurrencyInfo)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(code, info)| (code.into(), info)).collect())
    }
}

impl<'de> Deserialize<'de> for CurrencyCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = CurrencyCatalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping currency codes to currency info")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((code, info)) = map.next_entry::<String, CurrencyInfo>()? {
                    entries.push((code, info));
                }
                Ok(CurrencyCatalog(entries))
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

/// Exchange-rate payload, e.g. open.er-api.com `latest/{base}`.
#[derive(Deserialize)]
pub struct ErRates { pub rates: HashMap<String, f64> }
