use std::fmt;

use ndarray::{Array2, ArrayD, Ix2};

use crate::error::{CallistoError, Result};

/// Value of a single header card.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Bool(true) => write!(f, "T"),
            HeaderValue::Bool(false) => write!(f, "F"),
            HeaderValue::Int(v) => write!(f, "{}", v),
            HeaderValue::Float(v) => write!(f, "{}", v),
            HeaderValue::Text(v) => write!(f, "'{}'", v),
        }
    }
}

impl From<bool> for HeaderValue {
    fn from(v: bool) -> Self {
        HeaderValue::Bool(v)
    }
}

impl From<i64> for HeaderValue {
    fn from(v: i64) -> Self {
        HeaderValue::Int(v)
    }
}

impl From<f64> for HeaderValue {
    fn from(v: f64) -> Self {
        HeaderValue::Float(v)
    }
}

impl From<&str> for HeaderValue {
    fn from(v: &str) -> Self {
        HeaderValue::Text(v.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(v: String) -> Self {
        HeaderValue::Text(v)
    }
}

/// One keyword/value pair of an image header.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    /// Upper-case keyword.
    pub key: String,
    pub value: HeaderValue,
    pub comment: Option<String>,
}

/// Ordered image metadata. Keywords are case-insensitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.position(key).map(|i| &self.cards[i].value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert a card, replacing the value of an existing card with the same key
    /// in place.
    pub fn set(&mut self, key: &str, value: impl Into<HeaderValue>) {
        self.set_with_comment(key, value, None);
    }

    pub fn set_with_comment(
        &mut self,
        key: &str,
        value: impl Into<HeaderValue>,
        comment: Option<&str>,
    ) {
        let value = value.into();
        let comment = comment.map(str::to_string);
        match self.position(key) {
            Some(i) => {
                self.cards[i].value = value;
                if comment.is_some() {
                    self.cards[i].comment = comment;
                }
            }
            None => self.cards.push(Card {
                key: key.to_ascii_uppercase(),
                value,
                comment,
            }),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<HeaderValue> {
        self.position(key).map(|i| self.cards.remove(i).value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.cards
            .iter()
            .position(|c| c.key.eq_ignore_ascii_case(key))
    }
}

/// An image as handed in by a caller: a bare pixel array, or a pixel array
/// tagged with a header.
#[derive(Clone, Debug, PartialEq)]
pub enum Image {
    Bare(ArrayD<f32>),
    WithHeader { data: ArrayD<f32>, header: Header },
}

impl Image {
    pub fn bare(data: Array2<f32>) -> Self {
        Image::Bare(data.into_dyn())
    }

    pub fn with_header(data: Array2<f32>, header: Header) -> Self {
        Image::WithHeader {
            data: data.into_dyn(),
            header,
        }
    }

    pub fn data(&self) -> &ArrayD<f32> {
        match self {
            Image::Bare(data) => data,
            Image::WithHeader { data, .. } => data,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        match self {
            Image::Bare(_) => None,
            Image::WithHeader { header, .. } => Some(header),
        }
    }

    /// Wrap `data` in the same carrier variant as `self`, copying the header.
    pub fn rewrap(&self, data: Array2<f32>) -> Image {
        match self {
            Image::Bare(_) => Image::bare(data),
            Image::WithHeader { header, .. } => Image::with_header(data, header.clone()),
        }
    }

    fn describe(&self) -> String {
        let kind = match self {
            Image::Bare(_) => "array",
            Image::WithHeader { .. } => "image with header",
        };
        format!("{}-D {}", self.data().ndim(), kind)
    }
}

impl From<Array2<f32>> for Image {
    fn from(data: Array2<f32>) -> Self {
        Image::bare(data)
    }
}

impl From<ArrayD<f32>> for Image {
    fn from(data: ArrayD<f32>) -> Self {
        Image::Bare(data)
    }
}

/// Convert an image to a plain 2-D pixel array.
///
/// `context` starts the error message, e.g. `"Cannot align unexpected type"`;
/// the actual dimensionality and variant are appended.
pub fn to_array(image: &Image, context: &'static str) -> Result<Array2<f32>> {
    image
        .data()
        .view()
        .into_dimensionality::<Ix2>()
        .map(|view| view.to_owned())
        .map_err(|_| CallistoError::UnsupportedType {
            context,
            found: image.describe(),
        })
}

/// One image or an ordered sequence of images.
///
/// Operations that take `Images` return the same shape they were given.
#[derive(Clone, Debug, PartialEq)]
pub enum Images {
    Single(Image),
    Many(Vec<Image>),
}

impl Images {
    pub fn is_single(&self) -> bool {
        matches!(self, Images::Single(_))
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_slice(&self) -> &[Image] {
        match self {
            Images::Single(image) => std::slice::from_ref(image),
            Images::Many(images) => images,
        }
    }

    pub fn into_vec(self) -> Vec<Image> {
        match self {
            Images::Single(image) => vec![image],
            Images::Many(images) => images,
        }
    }

    /// Return the single image, or `None` for a sequence.
    pub fn into_single(self) -> Option<Image> {
        match self {
            Images::Single(image) => Some(image),
            Images::Many(_) => None,
        }
    }

    /// Build the output collection for a call whose input was `single` or not.
    pub(crate) fn collapse(mut outputs: Vec<Image>, single: bool) -> Images {
        if single && outputs.len() == 1 {
            Images::Single(outputs.remove(0))
        } else {
            Images::Many(outputs)
        }
    }
}

impl From<Image> for Images {
    fn from(image: Image) -> Self {
        Images::Single(image)
    }
}

impl From<Vec<Image>> for Images {
    fn from(images: Vec<Image>) -> Self {
        Images::Many(images)
    }
}

impl From<Array2<f32>> for Images {
    fn from(data: Array2<f32>) -> Self {
        Images::Single(Image::bare(data))
    }
}

impl From<Vec<Array2<f32>>> for Images {
    fn from(arrays: Vec<Array2<f32>>) -> Self {
        Images::Many(arrays.into_iter().map(Image::bare).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, ArrayD, IxDyn};

    #[test]
    fn header_keys_are_case_insensitive() {
        let mut header = Header::new();
        header.set("exptime", 30.0);
        header.set("EXPTIME", 60.0);
        assert_eq!(header.len(), 1);
        assert_eq!(header.get("ExpTime"), Some(&HeaderValue::Float(60.0)));
        assert_eq!(header.iter().next().map(|c| c.key.as_str()), Some("EXPTIME"));
    }

    #[test]
    fn header_preserves_insertion_order() {
        let mut header = Header::new();
        header.set("OBJECT", "M31");
        header.set("FILTER", "Ha");
        header.set_with_comment("GAIN", 1.5, Some("e-/ADU"));
        let keys: Vec<&str> = header.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["OBJECT", "FILTER", "GAIN"]);
        assert_eq!(header.remove("filter"), Some(HeaderValue::from("Ha")));
        assert!(!header.contains("FILTER"));
    }

    #[test]
    fn to_array_rejects_non_2d() {
        let cube = Image::Bare(ArrayD::zeros(IxDyn(&[2, 3, 4])));
        let err = to_array(&cube, "Cannot align unexpected type").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Cannot align unexpected type 3-D array"), "{}", msg);
    }

    #[test]
    fn rewrap_keeps_variant() {
        let mut header = Header::new();
        header.set("OBJECT", "NGC 7000");
        let tagged = Image::with_header(arr2(&[[1.0f32]]), header.clone());
        let out = tagged.rewrap(arr2(&[[2.0f32]]));
        assert_eq!(out.header(), Some(&header));

        let bare = Image::bare(arr2(&[[1.0f32]]));
        assert!(bare.rewrap(arr2(&[[2.0f32]])).header().is_none());
    }

    #[test]
    fn single_collapses_back() {
        let out = Images::collapse(vec![Image::bare(arr2(&[[0.0f32]]))], true);
        assert!(out.is_single());
        let out = Images::collapse(vec![Image::bare(arr2(&[[0.0f32]]))], false);
        assert!(!out.is_single());
        assert_eq!(out.len(), 1);
    }
}
