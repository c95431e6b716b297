use crate::detection::domain::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for turning detected faces into identity embeddings.
///
/// Returns one embedding per region, in region order.
pub trait FaceEmbedder: Send {
    fn embed(
        &mut self,
        frame: &Frame,
        regions: &[Region],
    ) -> Result<Vec<Embedding>, Box<dyn std::error::Error>>;
}
