use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PoseError {
    #[error("detection corners are degenerate, no homography exists")]
    DegenerateCorners,
}

#[derive(Debug, Error, PartialEq)]
pub enum LocateError {
    #[error("sight ray is parallel to the tag plane")]
    RayParallel,

    #[error("tag plane intersection lies behind the camera")]
    BehindCamera,

    #[error(transparent)]
    Pose(#[from] PoseError),
}

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("field dimensions must be positive, got {0} x {1}")]
    InvalidSize(f64, f64),

    #[error("boundary polygon needs at least 3 vertices, got {0}")]
    DegenerateBoundary(usize),
}
