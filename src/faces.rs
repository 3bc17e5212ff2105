//! Frontal-face detection over decoded images, with per-face crops
//! persisted as content-addressed artifacts.

use std::{
    cell::RefCell,
    collections::{HashMap, hash_map::Entry},
    path::Path,
    sync::Arc,
};

use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::{
    content_store::{ContentStore, PathDigest},
    error::Error,
};

/// Default minimum face edge in pixels.
pub const DEFAULT_MIN_FACE_SIZE: u32 = 40;

/// A detected face's bounding box in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum FaceError {
    #[error("face model unavailable: {0}")]
    Model(String),

    #[error("cannot persist face crop: {0}")]
    Persist(#[from] Error),
}

/// A face-detection capability over grayscale images.
pub trait FaceDetector: Send + Sync {
    fn detect(
        &self,
        gray: &GrayImage,
        min_size: u32,
    ) -> Result<Vec<FaceBox>, FaceError>;
}

thread_local! {
    /// rustface detectors keep mutable scratch state and are not `Send`,
    /// so every worker thread keeps its own, one per model file.
    static DETECTORS: RefCell<HashMap<String, Box<dyn rustface::Detector>>> =
        RefCell::new(HashMap::new());
}

/// Look up `key` in `cache`, building and storing the value on a miss,
/// and run `f` on it. A failed build is not cached.
fn with_cached<T, E, R>(
    cache: &RefCell<HashMap<String, T>>,
    key: &str,
    build: impl FnOnce() -> Result<T, E>,
    f: impl FnOnce(&mut T) -> R,
) -> Result<R, E> {
    let mut cache = cache.borrow_mut();
    let value = match cache.entry(key.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => entry.insert(build()?),
    };
    Ok(f(value))
}

/// SeetaFace frontal detector (via `rustface`).
///
/// The model is checked once up front; each worker thread then parses it
/// once into a detector of its own and reuses that for later images.
pub struct SeetaDetector {
    model_path: String,
}

impl SeetaDetector {
    pub fn new(model_path: &Path) -> Result<Self, FaceError> {
        let model_path = model_path.to_string_lossy().into_owned();
        rustface::create_detector(&model_path)
            .map_err(|e| FaceError::Model(format!("{model_path}: {e}")))?;
        Ok(Self { model_path })
    }
}

impl FaceDetector for SeetaDetector {
    fn detect(
        &self,
        gray: &GrayImage,
        min_size: u32,
    ) -> Result<Vec<FaceBox>, FaceError> {
        DETECTORS.with(|cache| {
            with_cached(
                cache,
                &self.model_path,
                || {
                    rustface::create_detector(&self.model_path)
                        .map_err(|e| FaceError::Model(e.to_string()))
                },
                |detector| {
                    detector.set_min_face_size(min_size.max(20));
                    detector.set_score_thresh(2.0);
                    detector.set_pyramid_scale_factor(0.8);
                    detector.set_slide_window_step(4, 4);

                    let mut data = rustface::ImageData::new(
                        gray.as_raw(),
                        gray.width(),
                        gray.height(),
                    );
                    detector
                        .detect(&mut data)
                        .into_iter()
                        .filter_map(|face| {
                            let bbox = face.bbox();
                            visible_box(
                                bbox.x().into(),
                                bbox.y().into(),
                                bbox.width().into(),
                                bbox.height().into(),
                            )
                        })
                        .collect()
                },
            )
        })
    }
}

/// The part of a detector rectangle with non-negative coordinates. An
/// origin left of or above the image trims the box rather than moving it.
fn visible_box(x: i64, y: i64, width: i64, height: i64) -> Option<FaceBox> {
    let (left, top) = (x.max(0), y.max(0));
    let (right, bottom) = (x + width, y + height);
    if right <= left || bottom <= top {
        return None;
    }
    Some(FaceBox {
        x: u32::try_from(left).ok()?,
        y: u32::try_from(top).ok()?,
        width: u32::try_from(right - left).ok()?,
        height: u32::try_from(bottom - top).ok()?,
    })
}

/// Faces found in one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceReport {
    pub count: u32,
    /// Crop file names, in face-index order.
    pub files: Vec<String>,
}

/// Runs a [`FaceDetector`] and writes one JPEG crop per face.
#[derive(Clone)]
pub struct FaceCropper {
    detector: Arc<dyn FaceDetector>,
    min_size: u32,
}

impl FaceCropper {
    pub fn new(detector: Arc<dyn FaceDetector>, min_size: u32) -> Self {
        Self { detector, min_size }
    }

    /// Detect faces and persist their crops. Any failure degrades to
    /// "no faces": detection is never a reason to drop a file.
    pub fn detect_faces(
        &self,
        image: &DynamicImage,
        digest: &PathDigest,
        store: &ContentStore,
    ) -> FaceReport {
        match self.try_detect_faces(image, digest, store) {
            Ok(report) => report,
            Err(e) => {
                debug!(%digest, "face detection failed: {e}");
                FaceReport::default()
            }
        }
    }

    fn try_detect_faces(
        &self,
        image: &DynamicImage,
        digest: &PathDigest,
        store: &ContentStore,
    ) -> Result<FaceReport, FaceError> {
        let mut boxes: Vec<FaceBox> = self
            .detector
            .detect(&image.to_luma8(), self.min_size)?
            .into_iter()
            .filter_map(|b| clamp(b, image.width(), image.height()))
            .filter(|b| b.width >= self.min_size && b.height >= self.min_size)
            .collect();
        // Detector output order is unspecified; sort so crop names are
        // stable across runs.
        boxes.sort_by_key(|b| (b.y, b.x));

        let mut files = Vec::with_capacity(boxes.len());
        for (index, b) in boxes.iter().enumerate() {
            let crop = image.crop_imm(b.x, b.y, b.width, b.height);
            files.push(store.write_face(digest, index, &crop)?);
        }

        Ok(FaceReport {
            count: files.len() as u32,
            files,
        })
    }
}

/// Intersect a box with the image bounds; `None` if nothing remains.
fn clamp(b: FaceBox, width: u32, height: u32) -> Option<FaceBox> {
    if b.x >= width || b.y >= height {
        return None;
    }
    let w = b.width.min(width - b.x);
    let h = b.height.min(height - b.y);
    (w > 0 && h > 0).then_some(FaceBox {
        x: b.x,
        y: b.y,
        width: w,
        height: h,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::output_dir::OutputDir;

    struct FixedDetector(Vec<FaceBox>);

    impl FaceDetector for FixedDetector {
        fn detect(
            &self,
            _gray: &GrayImage,
            _min_size: u32,
        ) -> Result<Vec<FaceBox>, FaceError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenDetector;

    impl FaceDetector for BrokenDetector {
        fn detect(
            &self,
            _gray: &GrayImage,
            _min_size: u32,
        ) -> Result<Vec<FaceBox>, FaceError> {
            Err(FaceError::Model("no model".into()))
        }
    }

    fn face(x: u32, y: u32, size: u32) -> FaceBox {
        FaceBox {
            x,
            y,
            width: size,
            height: size,
        }
    }

    fn setup() -> (tempfile::TempDir, ContentStore, PathDigest) {
        let tmp = tempfile::tempdir().unwrap();
        let output = OutputDir::resolve(Some(tmp.path())).unwrap();
        let digest = PathDigest::of(Path::new("/archive/party.png"));
        (tmp, ContentStore::new(&output), digest)
    }

    #[test]
    fn writes_one_crop_per_face_sorted_top_left_first() {
        let (_tmp, store, digest) = setup();
        let cropper = FaceCropper::new(
            Arc::new(FixedDetector(vec![
                face(100, 50, 40),
                face(10, 50, 50),
                face(60, 0, 45),
            ])),
            DEFAULT_MIN_FACE_SIZE,
        );
        let image = DynamicImage::new_rgb8(200, 200);

        let report = cropper.detect_faces(&image, &digest, &store);
        assert_eq!(report.count, 3);
        assert_eq!(
            report.files,
            vec![
                digest.face_name(0),
                digest.face_name(1),
                digest.face_name(2)
            ]
        );

        let first = image::open(store.faces_dir().join(&report.files[0]))
            .unwrap();
        assert_eq!((first.width(), first.height()), (45, 45));
        let second = image::open(store.faces_dir().join(&report.files[1]))
            .unwrap();
        assert_eq!((second.width(), second.height()), (50, 50));
    }

    #[test]
    fn small_and_out_of_bounds_boxes_are_dropped() {
        let (_tmp, store, digest) = setup();
        let cropper = FaceCropper::new(
            Arc::new(FixedDetector(vec![
                face(0, 0, 20),
                face(500, 500, 60),
                face(80, 80, 60),
            ])),
            DEFAULT_MIN_FACE_SIZE,
        );
        let image = DynamicImage::new_rgb8(100, 100);

        // The last box is clipped to 20x20 by the image edge.
        let report = cropper.detect_faces(&image, &digest, &store);
        assert_eq!(report, FaceReport::default());
    }

    #[test]
    fn no_faces_is_not_an_error() {
        let (_tmp, store, digest) = setup();
        let cropper = FaceCropper::new(
            Arc::new(FixedDetector(vec![])),
            DEFAULT_MIN_FACE_SIZE,
        );

        let report =
            cropper.detect_faces(&DynamicImage::new_rgb8(64, 64), &digest, &store);
        assert_eq!(report.count, 0);
        assert!(report.files.is_empty());
    }

    #[test]
    fn detector_failure_degrades_to_zero() {
        let (_tmp, store, digest) = setup();
        let cropper =
            FaceCropper::new(Arc::new(BrokenDetector), DEFAULT_MIN_FACE_SIZE);

        let report =
            cropper.detect_faces(&DynamicImage::new_rgb8(64, 64), &digest, &store);
        assert_eq!(report, FaceReport::default());
    }

    #[test]
    fn missing_model_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let result = SeetaDetector::new(&tmp.path().join("missing.bin"));
        assert!(matches!(result, Err(FaceError::Model(_))));
    }

    #[test]
    fn negative_origin_trims_the_box() {
        assert_eq!(visible_box(-10, -5, 50, 50), Some(FaceBox {
            x: 0,
            y: 0,
            width: 40,
            height: 45
        }));
        assert_eq!(visible_box(12, 30, 48, 48), Some(face(12, 30, 48)));
    }

    #[test]
    fn box_entirely_off_the_top_left_is_dropped() {
        assert_eq!(visible_box(-60, 10, 50, 50), None);
        assert_eq!(visible_box(10, -50, 50, 50), None);
    }

    #[test]
    fn detectors_are_built_once_per_key() {
        let cache = RefCell::new(HashMap::new());
        let mut builds = 0;
        for _ in 0..3 {
            let seen = with_cached(
                &cache,
                "model.bin",
                || {
                    builds += 1;
                    Ok::<_, FaceError>(7_u32)
                },
                |v| *v,
            )
            .unwrap();
            assert_eq!(seen, 7);
        }
        assert_eq!(builds, 1);

        with_cached(&cache, "other.bin", || Ok::<_, FaceError>(1), |_| ())
            .unwrap();
        assert_eq!(cache.borrow().len(), 2);
    }

    #[test]
    fn failed_builds_are_retried() {
        let cache: RefCell<HashMap<String, u32>> = RefCell::new(HashMap::new());
        let failed = with_cached(
            &cache,
            "model.bin",
            || Err(FaceError::Model("unreadable".into())),
            |v| *v,
        );
        assert!(failed.is_err());
        assert!(cache.borrow().is_empty());

        let value =
            with_cached(&cache, "model.bin", || Ok::<_, FaceError>(3), |v| *v)
                .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn clamp_trims_to_image() {
        assert_eq!(clamp(face(90, 90, 40), 100, 100), Some(FaceBox {
            x: 90,
            y: 90,
            width: 10,
            height: 10
        }));
        assert_eq!(clamp(face(100, 0, 10), 100, 100), None);
    }
}
