//! IIIF Presentation (v2) manifest model, restricted to the shape published
//! by DigiVatLib: `sequences[0].canvases[*].images[0].resource.service["@id"]`.
//!
//! Parsing is two-phase. The body is first parsed as generic JSON and the
//! structure required for page extraction is validated, so a manifest of the
//! wrong shape fails fast with [`MissingStructure`](ErrorKind::MissingStructure)
//! naming the absent path. Only then is it deserialized into the typed model,
//! where everything below the canvas level is optional: a canvas without a
//! resolvable image service is dropped during [extraction](Manifest::image_list),
//! not rejected here.

mod images;

pub use self::images::{DroppedCanvas, ImageList, extract_image_urls};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Manifest {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(default)]
    label: Option<Value>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub canvases: Vec<Canvas>,
}

/// One page (surface) of the manuscript.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Canvas {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(default)]
    label: Option<Value>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub resource: Option<Resource>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub service: Option<ServiceRef>,
}

/// Some manifests list a single service object, others an array of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ServiceRef {
    One(Service),
    Many(Vec<Service>),
}
impl ServiceRef {
    /// Identifier of the (first) image service, if it has one.
    pub fn id(&self) -> Option<&str> {
        let service = match self {
            Self::One(service) => Some(service),
            Self::Many(services) => services.first(),
        };
        service.and_then(|s| s.id.as_deref()).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Service {
    #[serde(rename = "@id", alias = "id", default)]
    pub id: Option<String>,
}

fn label_text(label: Option<&Value>) -> Option<&str> {
    match label? {
        Value::String(s) => Some(s.as_str()),
        // IIIF v2 also allows `[{"@value": "…", "@language": "…"}]`.
        Value::Array(values) => values.iter().find_map(|v| v.get("@value").and_then(Value::as_str)),
        Value::Object(map) => map.get("@value").and_then(Value::as_str),
        _ => None,
    }
}

impl Manifest {
    /// Parse and validate a manifest document.
    #[instrument(skip(json), fields(json_size = json.len()))]
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).or_raise(|| ErrorKind::MalformedJson)?;
        validate_shape(&value)?;
        let manifest: Self =
            serde_json::from_value(value).or_raise(|| ErrorKind::MissingStructure("sequences[0].canvases".into()))?;
        tracing::debug!(id = manifest.id.as_deref(), canvases = manifest.canvases().len(), "Parsed IIIF manifest");
        Ok(manifest)
    }

    pub fn label(&self) -> Option<&str> {
        label_text(self.label.as_ref())
    }

    /// Canvases of the first sequence; any further sequences are ignored.
    pub fn canvases(&self) -> &[Canvas] {
        self.sequences.first().map(|s| s.canvases.as_slice()).unwrap_or_default()
    }
}
impl FromStr for Manifest {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Canvas {
    pub fn label(&self) -> Option<&str> {
        label_text(self.label.as_ref())
    }

    /// Image service identifier of the canvas' first image.
    pub fn service_id(&self) -> Option<&str> {
        self.images.first()?.resource.as_ref()?.service.as_ref()?.id()
    }
}

fn validate_shape(value: &Value) -> Result<()> {
    let missing = |path: &str| ErrorKind::MissingStructure(path.to_string());
    if !value.is_object() {
        exn::bail!(missing("manifest object"));
    }
    let Some(sequences) = value.get("sequences").and_then(Value::as_array) else {
        exn::bail!(missing("sequences"));
    };
    let Some(first) = sequences.first() else {
        exn::bail!(missing("sequences[0]"));
    };
    if !first.get("canvases").is_some_and(Value::is_array) {
        exn::bail!(missing("sequences[0].canvases"));
    }
    Ok(())
}
