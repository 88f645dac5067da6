use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::glm;

lazy_static! {
    static ref KEY_VALUE_REGEX: Regex =
        Regex::new(r#""([^"]+)"\s+"([^"]*)""#).expect("Could not compile entity key/value regex");
}

/// One entity from the ENTITIES lump: a free-form string-keyed property map.
/// There is no fixed schema; consumers dispatch on `classname`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Entity {
    pub(crate) properties: HashMap<String, String>,
}

impl Entity {
    /// Parse the body of one brace-delimited block, one `"key" "value"` pair
    /// per line. Blocks yielding no pairs produce `None` and are dropped by
    /// the caller.
    pub fn from_block(block: &str) -> Option<Self> {
        let mut properties: HashMap<String, String> = HashMap::new();
        for line in block.lines() {
            let trimmed: &str = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(captures) = KEY_VALUE_REGEX.captures(trimmed) {
                properties.insert(captures[1].to_string(), captures[2].to_string());
            }
        }
        if properties.is_empty() {
            None
        } else {
            Some(Entity { properties })
        }
    }

    pub fn find_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn classname(&self) -> Option<&str> {
        self.find_property("classname")
    }

    /// The `origin` property as a vector; present on point entities.
    pub fn origin(&self) -> Option<glm::Vec3> {
        self.find_property("origin").map(parse_origin)
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}

/// Parse a space-separated float triple; components that are missing or
/// unparseable read as zero.
pub fn parse_origin(origin: &str) -> glm::Vec3 {
    let mut components = origin
        .split_whitespace()
        .map(|part| part.parse::<f32>().unwrap_or(0.0));
    glm::vec3(
        components.next().unwrap_or(0.0),
        components.next().unwrap_or(0.0),
        components.next().unwrap_or(0.0),
    )
}
