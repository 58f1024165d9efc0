use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("option is empty")]
    Empty,
    #[error("option {0:?} is already on the wheel")]
    Duplicate(String),
    #[error("no option at index {0}")]
    OutOfRange(usize),
}

/// Ordered wheel labels, trimmed and unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct OptionList(Vec<String>);

impl OptionList {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_labels<I, S>(labels: I) -> Result<Self, OptionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::empty();
        for label in labels {
            list.add(label.as_ref())?;
        }
        Ok(list)
    }

    pub fn add(&mut self, text: &str) -> Result<(), OptionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(OptionError::Empty);
        }
        if self.0.iter().any(|o| o == text) {
            return Err(OptionError::Duplicate(text.to_string()));
        }
        self.0.push(text.to_string());
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<String, OptionError> {
        if index >= self.0.len() {
            return Err(OptionError::OutOfRange(index));
        }
        Ok(self.0.remove(index))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for OptionList {
    fn default() -> Self {
        Self(
            ["Pizza 🍕", "Tacos 🌮", "Sushi 🍣", "Pasta 🍝"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }
}

impl TryFrom<Vec<String>> for OptionList {
    type Error = OptionError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_labels(labels)
    }
}

impl From<OptionList> for Vec<String> {
    fn from(list: OptionList) -> Self {
        list.0
    }
}
