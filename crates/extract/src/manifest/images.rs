use super::Manifest;
use crate::consts::FULL_IMAGE_SUFFIX;
use tracing::instrument;

/// A canvas that produced no image URL because it has no resolvable image
/// service. Page indices after it shift down by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedCanvas {
    /// Position of the canvas within the first sequence.
    pub index: usize,
    pub canvas_id: Option<String>,
    pub label: Option<String>,
}

/// Full-resolution image URLs in canvas order, one per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageList {
    pub urls: Vec<String>,
    /// Canvases skipped during extraction, kept for diagnosis.
    pub dropped: Vec<DroppedCanvas>,
}
impl ImageList {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl Manifest {
    /// Builds the IIIF Image API request `{service}/full/full/0/default.jpg`
    /// for the first image of every canvas in the first sequence.
    ///
    /// Canvases without an image service are left out of
    /// [`urls`](ImageList::urls) and recorded in [`dropped`](ImageList::dropped).
    #[instrument(level = "debug", skip(self), fields(manifest = self.id.as_deref()))]
    pub fn image_list(&self) -> ImageList {
        let mut list = ImageList::default();
        for (index, canvas) in self.canvases().iter().enumerate() {
            match canvas.service_id() {
                Some(service) => {
                    list.urls.push(format!("{}{}", service.trim_end_matches('/'), FULL_IMAGE_SUFFIX));
                },
                None => {
                    tracing::warn!(index, canvas = canvas.id.as_deref(), "Canvas has no image service; dropping page");
                    list.dropped.push(DroppedCanvas {
                        index,
                        canvas_id: canvas.id.clone(),
                        label: canvas.label().map(str::to_string),
                    });
                },
            }
        }
        list
    }
}

/// See [`Manifest::image_list`].
pub fn extract_image_urls(manifest: &Manifest) -> ImageList {
    manifest.image_list()
}
