/// Serde adapters for `tracing::Level`, written as its lowercase name.
pub mod level {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use tracing::Level;

    fn parse<E: Error>(name: &str) -> Result<Level, E> {
        name.parse::<Level>()
            .map_err(|_| E::custom(format!("unknown log level '{name}'")))
    }

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        parse(&String::deserialize(deserializer)?)
    }

    /// Same as the parent module for an optional level. `None` stays unset.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use tracing::Level;

        pub fn serialize<S: Serializer>(
            level: &Option<Level>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match level {
                Some(level) => super::serialize(level, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Level>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|name| super::parse(&name))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use tracing::Level;

    #[derive(Debug, PartialEq, Deserialize, Serialize)]
    struct Levels {
        #[serde(with = "super::level")]
        required: Level,
        #[serde(with = "super::level::option", default)]
        optional: Option<Level>,
    }

    #[test]
    fn writes_lowercase_names() {
        let yaml = serde_yaml::to_string(&Levels {
            required: Level::WARN,
            optional: Some(Level::DEBUG),
        })
        .expect("levels should serialize");
        assert_eq!(yaml, "required: warn\noptional: debug\n");
    }

    #[test]
    fn reads_any_case_and_missing_optional() {
        let levels: Levels = serde_yaml::from_str("required: TRACE\n").expect("should parse");
        assert_eq!(
            levels,
            Levels {
                required: Level::TRACE,
                optional: None,
            }
        );
    }

    #[test]
    fn rejects_unknown_level() {
        let err = serde_yaml::from_str::<Levels>("required: loud\n").expect_err("expected error");
        assert!(err.to_string().contains("unknown log level 'loud'"), "{err}");
    }
}
