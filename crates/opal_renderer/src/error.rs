use thiserror::Error;

/// Construction-fatal failures.
///
/// Every variant aborts scene construction and propagates to the caller;
/// none of these are recovered into a degenerate render.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("cannot build a bounding volume hierarchy from an empty primitive list")]
    EmptyScene,

    #[error("scene has no camera")]
    MissingCamera,

    #[error("no shader named `{0}` is defined")]
    UnknownShader(String),

    #[error("instance transform is not invertible")]
    SingularTransform,

    #[error("sample count {0} is not a positive perfect square")]
    BadSampleCount(usize),

    #[error("mesh index {index} out of range ({count} vertices)")]
    MeshIndex { index: usize, count: usize },

    #[error("mesh has {normals} normals for {vertices} vertices")]
    MeshNormals { normals: usize, vertices: usize },
}
