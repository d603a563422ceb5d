//! Ordered trigger → answer table.
//!
//! Serialized as a JSON object; entry order is kept so the widget renders
//! the buttons in the order the operator configured them.

use {
    serde::{
        Deserialize, Deserializer, Serialize, Serializer,
        de::{MapAccess, Visitor},
        ser::SerializeMap,
    },
    std::fmt,
};

use crate::{Error, Result};

/// Canned replies keyed by the exact visitor text that triggers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickReplies {
    entries: Vec<(String, String)>,
}

impl Default for QuickReplies {
    fn default() -> Self {
        Self::from_pairs([
            (
                "Dasturlar haqida ma'lumot",
                "Bizning dasturlar:\n\n1. Language Preparation Courses\n2. Foundation Programme\n3. Bachelor's Degree\n4. Master's Degree",
            ),
            (
                "Konsultatsiya olish",
                "Konsultatsiya olish uchun quyidagi formani to'ldiring",
            ),
            (
                "Aloqa ma'lumotlari",
                "Aloqa ma'lumotlari:\n\n📞 Telefon: +998 71 200 08 11\n📧 Email: info@buranconsulting.uz\n📍 Manzil: Toshkent shahri",
            ),
        ])
    }
}

impl QuickReplies {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self {
            entries: Vec::new(),
        };
        for (k, v) in pairs {
            table.insert(k, v);
        }
        table
    }

    /// Insert or replace, keeping the position of an existing trigger.
    pub fn insert(&mut self, trigger: impl Into<String>, answer: impl Into<String>) {
        let trigger = trigger.into();
        let answer = answer.into();
        match self.entries.iter_mut().find(|(k, _)| *k == trigger) {
            Some(entry) => entry.1 = answer,
            None => self.entries.push((trigger, answer)),
        }
    }

    /// Answer for `text`. Exact match: no trimming, no case folding.
    pub fn lookup(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == text)
            .map(|(_, v)| v.as_str())
    }

    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject tables the widget could not render.
    pub fn validate(&self) -> Result<()> {
        for (trigger, answer) in &self.entries {
            if trigger.trim().is_empty() {
                return Err(Error::EmptyTrigger);
            }
            if answer.trim().is_empty() {
                return Err(Error::EmptyAnswer {
                    trigger: trigger.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Serialize for QuickReplies {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QuickReplies {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = QuickReplies;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of trigger text to answer text")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut table = QuickReplies {
                    entries: Vec::with_capacity(access.size_hint().unwrap_or(0)),
                };
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    table.insert(k, v);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("Aloqa ma'lumotlari", true)]
    #[case("aloqa ma'lumotlari", false)]
    #[case("Aloqa ma'lumotlari ", false)]
    #[case(" Konsultatsiya olish", false)]
    #[case("Konsultatsiya olish", true)]
    fn lookup_is_exact(#[case] text: &str, #[case] hit: bool) {
        assert_eq!(QuickReplies::default().lookup(text).is_some(), hit);
    }

    #[test]
    fn defaults_carry_contact_details() {
        let table = QuickReplies::default();
        assert_eq!(table.len(), 3);
        let contact = table.lookup("Aloqa ma'lumotlari").unwrap();
        assert!(contact.contains("+998 71 200 08 11"));
        assert!(contact.contains("info@buranconsulting.uz"));
    }

    #[test]
    fn json_keeps_document_order() {
        let table: QuickReplies =
            serde_json::from_str(r#"{"Zeta":"z","Alpha":"a","Mid":"m"}"#).unwrap();
        assert_eq!(table.triggers().collect::<Vec<_>>(), ["Zeta", "Alpha", "Mid"]);
        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"{"Zeta":"z","Alpha":"a","Mid":"m"}"#
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut table = QuickReplies::from_pairs([("a", "1"), ("b", "2")]);
        table.insert("a", "3");
        assert_eq!(table.triggers().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(table.lookup("a"), Some("3"));
    }

    #[test]
    fn validate_rejects_blank_answer() {
        let table = QuickReplies::from_pairs([("Salom", " ")]);
        assert!(matches!(table.validate(), Err(Error::EmptyAnswer { .. })));
    }
}
