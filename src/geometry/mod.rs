mod hit;
mod ray;
mod triangle;

pub use hit::HitRecord;
pub use ray::Ray;
pub use triangle::{BarycentricCoordinates, Triangle};

pub type FloatType = f32;

pub type WorldPoint = nalgebra::Point3<FloatType>;
pub type WorldVector = nalgebra::Vector3<FloatType>;
pub type TexturePoint = nalgebra::Point2<FloatType>;

pub type SimdFloatType = simba::simd::WideF32x4;
pub type SimdMaskType = simba::simd::WideBoolF32x4;
pub type WorldPoint4 = nalgebra::Point3<SimdFloatType>;
