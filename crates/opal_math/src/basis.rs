use crate::Vec3;

/// A right-handed orthonormal basis.
///
/// By convention `w` opposes the vector the basis was built from, so a
/// camera looking along `-w` sees its view direction.
#[derive(Debug, Clone, Copy)]
pub struct Basis {
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Basis {
    /// Build a basis from a single vector. `w` opposes `a`; `u` and `v`
    /// are chosen by crossing against the axis `w` leans on least.
    pub fn from_w(a: Vec3) -> Self {
        let w = (-a).normalize();

        // Copy w and bump its smallest-magnitude component so the cross
        // product below cannot vanish.
        let mut t = w;
        let abs = w.abs();
        if abs.x <= abs.y && abs.x <= abs.z {
            t.x = 1.0;
        } else if abs.y <= abs.x && abs.y <= abs.z {
            t.y = 1.0;
        } else {
            t.z = 1.0;
        }

        let u = t.cross(w).normalize();
        let v = w.cross(u);

        Self { u, v, w }
    }

    /// Build a basis from a view direction and an up hint.
    pub fn from_w_up(a: Vec3, up: Vec3) -> Self {
        let w = (-a).normalize();
        let u = up.cross(w).normalize();
        let v = w.cross(u);
        Self { u, v, w }
    }

    pub fn u(&self) -> Vec3 {
        self.u
    }

    pub fn v(&self) -> Vec3 {
        self.v
    }

    pub fn w(&self) -> Vec3 {
        self.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(basis: &Basis) {
        assert!((basis.u().length() - 1.0).abs() < 1e-12);
        assert!((basis.v().length() - 1.0).abs() < 1e-12);
        assert!((basis.w().length() - 1.0).abs() < 1e-12);
        assert!(basis.u().dot(basis.v()).abs() < 1e-12);
        assert!(basis.u().dot(basis.w()).abs() < 1e-12);
        assert!(basis.v().dot(basis.w()).abs() < 1e-12);
    }

    #[test]
    fn test_basis_from_w() {
        for a in [
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.3, 0.4, -0.9),
            Vec3::new(1.0, 1.0, 1.0),
        ] {
            let basis = Basis::from_w(a);
            assert_orthonormal(&basis);
            assert!(
                (basis.w() + a.normalize()).length() < 1e-12,
                "w must oppose the input vector"
            );
        }
    }

    #[test]
    fn test_basis_from_w_up() {
        let basis = Basis::from_w_up(Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        assert_orthonormal(&basis);
        // Looking down -z with +y up gives a u pointing along +x.
        assert!((basis.u() - Vec3::X).length() < 1e-12);
        assert!((basis.v() - Vec3::Y).length() < 1e-12);
    }
}
