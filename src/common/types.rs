use scenegraph_io_derive_streamable::Streamable;

#[derive(Debug, Copy, Clone, PartialEq, Streamable)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Streamable)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    pub const BLACK: ColorRgba = ColorRgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub const WHITE: ColorRgba = ColorRgba {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
}

/// Column-major 4x4 transform, the usual retained-mode convention.
#[derive(Debug, Copy, Clone, PartialEq, Streamable)]
pub struct Matrix4 {
    pub values: [f32; 16],
}

impl Matrix4 {
    pub const IDENTITY: Matrix4 = Matrix4 {
        values: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
        let mut matrix = Matrix4::IDENTITY;
        matrix.values[12] = x;
        matrix.values[13] = y;
        matrix.values[14] = z;
        matrix
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Matrix4::IDENTITY
    }
}

/// Spatial extent for bounds leaves. The wire form is a one-byte
/// discriminant followed by the variant fields, see the codec module.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BoundingVolume {
    Sphere { center: Vector3, radius: f32 },
    Aabb { min: Vector3, max: Vector3 },
}
