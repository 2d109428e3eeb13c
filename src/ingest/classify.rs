//! Resolution classifier: maps source dimensions to one of four aspect
//! classes and the thumbnail size that class renders at.

use crate::db::AspectClass;

/// Target thumbnail dimensions plus the class that chose them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub aspect: AspectClass,
    pub width: u32,
    pub height: u32,
}

/// Bucket an image by its dimensions. First matching rule wins:
/// both sides >= 1600 is big, then the 1.3 ratio picks landscape or
/// portrait, everything else is small.
///
/// Total for all positive inputs; callers must reject zero dimensions
/// before getting here (the metadata extractor does).
pub fn classify(width: u32, height: u32) -> ThumbnailSpec {
    debug_assert!(width > 0 && height > 0);

    if width >= 1600 && height >= 1600 {
        return ThumbnailSpec {
            aspect: AspectClass::Big,
            width: 400,
            height: 400,
        };
    }

    if width >= height && width as f64 / height as f64 >= 1.3 {
        return ThumbnailSpec {
            aspect: AspectClass::Landscape,
            width: 400,
            height: 200,
        };
    }

    if height >= width && height as f64 / width as f64 >= 1.3 {
        return ThumbnailSpec {
            aspect: AspectClass::Portrait,
            width: 200,
            height: 400,
        };
    }

    ThumbnailSpec {
        aspect: AspectClass::Small,
        width: 200,
        height: 200,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_needs_both_dimensions() {
        assert_eq!(classify(1600, 1600).aspect, AspectClass::Big);
        assert_eq!(classify(3840, 2160).aspect, AspectClass::Big);
        // one side short of 1600 falls through to the ratio rules
        assert_eq!(classify(1599, 1600).aspect, AspectClass::Small);
        assert_eq!(classify(2560, 1440).aspect, AspectClass::Landscape);
    }

    #[test]
    fn ratio_boundary_is_inclusive() {
        assert_eq!(classify(1300, 1000).aspect, AspectClass::Landscape);
        assert_eq!(classify(1000, 1300).aspect, AspectClass::Portrait);
        assert_eq!(classify(1299, 1000).aspect, AspectClass::Small);
    }

    #[test]
    fn near_square_is_small() {
        assert_eq!(classify(1000, 1000).aspect, AspectClass::Small);
        assert_eq!(classify(1, 1).aspect, AspectClass::Small);
    }

    #[test]
    fn targets_follow_class() {
        let spec = classify(2000, 2000);
        assert_eq!((spec.width, spec.height), (400, 400));
        let spec = classify(800, 400);
        assert_eq!((spec.width, spec.height), (400, 200));
        let spec = classify(400, 800);
        assert_eq!((spec.width, spec.height), (200, 400));
        let spec = classify(300, 300);
        assert_eq!((spec.width, spec.height), (200, 200));
    }

    #[test]
    fn exactly_one_class_for_a_sweep() {
        for w in [1u32, 199, 200, 1299, 1300, 1599, 1600, 4000] {
            for h in [1u32, 199, 200, 1299, 1300, 1599, 1600, 4000] {
                // must not panic and must produce a valid persisted value
                let spec = classify(w, h);
                assert!(AspectClass::from_db(spec.aspect.as_db()).is_some());
            }
        }
    }
}
