/// A fixed-length face identity vector.
///
/// Constructed L2-normalized so the dot product of two embeddings is their
/// cosine similarity.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn normalized(mut values: Vec<f32>) -> Self {
        l2_normalize(&mut values);
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cosine_similarity(&self, other: &Embedding) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(x, y)| (*x as f64) * (*y as f64))
            .sum()
    }

    /// `1 - cosine similarity`: 0 for identical faces, up to 2 for opposite.
    pub fn distance(&self, other: &Embedding) -> f64 {
        1.0 - self.cosine_similarity(other)
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
