use serde::Deserialize;

/// Accepts either a single value or an array when deserializing.
///
/// Payloads written by older clients frequently carry a bare object (or a
/// bare string) where the resource definition calls for a list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SingleOrVec<T> {
    Vec(Vec<T>),
    Single(T),
}

impl<T> SingleOrVec<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            SingleOrVec::Single(value) => vec![value],
            SingleOrVec::Vec(values) => values,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            SingleOrVec::Single(value) => std::slice::from_ref(value).iter(),
            SingleOrVec::Vec(values) => values.iter(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SingleOrVec::Vec(values) if values.is_empty())
    }
}

impl<T> Default for SingleOrVec<T> {
    fn default() -> Self {
        SingleOrVec::Vec(Vec::new())
    }
}

/// Captures either a raw primitive JSON value or a structured element.
///
/// `"name": "John"` and `"name": {"family": "Smith"}` both parse.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveOrElement<T> {
    Primitive(serde_json::Value),
    Element(T),
}

impl<T> PrimitiveOrElement<T> {
    pub fn element(&self) -> Option<&T> {
        match self {
            PrimitiveOrElement::Element(element) => Some(element),
            PrimitiveOrElement::Primitive(_) => None,
        }
    }
}

impl<'de, T> Deserialize<'de> for PrimitiveOrElement<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.is_object() {
            let element = T::deserialize(value).map_err(serde::de::Error::custom)?;
            Ok(PrimitiveOrElement::Element(element))
        } else {
            Ok(PrimitiveOrElement::Primitive(value))
        }
    }
}
