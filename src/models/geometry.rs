//! 曲面多様体の座標変換と距離計算
//!
//! 球面は `(r, θ, φ)`（θ は赤道面からの仰角、φ は方位角）、
//! トーラスは `(u, v)`（u は中心軸まわり、v はチューブまわりの角度）で表します。

/// 球面座標系のヘルパー
pub mod sphere {
    use crate::models::common::Point3D;

    /// 極の特異点判定に使う閾値
    pub const POLE_EPSILON: f64 = 1e-6;

    /// 球面座標 `(r, θ, φ)` を直交座標に変換
    pub fn spherical_to_cartesian(r: f64, theta: f64, phi: f64) -> Point3D {
        Point3D::new(
            r * theta.cos() * phi.cos(),
            r * theta.cos() * phi.sin(),
            r * theta.sin(),
        )
    }

    /// 点 `(r, θ, φ)` における直交座標の速度ベクトルを `(dr, dθ, dφ)` に変換
    ///
    /// 極 (`|cos θ| < POLE_EPSILON`) では方位角が定義できないため `dφ/dt = 0` とします。
    pub fn cartesian_velocity_to_spherical(
        r: f64,
        theta: f64,
        phi: f64,
        velocity: Point3D,
    ) -> [f64; 3] {
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_p, cos_p) = phi.sin_cos();
        let Point3D { x: vx, y: vy, z: vz } = velocity;

        let dr = cos_t * cos_p * vx + cos_t * sin_p * vy + sin_t * vz;
        let dtheta = (-sin_t * cos_p * vx - sin_t * sin_p * vy + cos_t * vz) / r;
        let dphi = if cos_t.abs() < POLE_EPSILON {
            0.0
        } else {
            (-sin_p * vx + cos_p * vy) / (r * cos_t)
        };
        [dr, dtheta, dphi]
    }

    /// 大円に沿った角距離（ラジアン）
    ///
    /// 球面余弦定理を使い、浮動小数点の誤差でドメイン外に出ないよう [-1, 1] にクランプします。
    pub fn great_circle_distance(theta_a: f64, phi_a: f64, theta_b: f64, phi_b: f64) -> f64 {
        let cos_dist = theta_a.sin() * theta_b.sin()
            + theta_a.cos() * theta_b.cos() * (phi_b - phi_a).cos();
        cos_dist.clamp(-1.0, 1.0).acos()
    }

    /// 追跡者の位置で接平面に射影した、目標方向の単位ベクトル（直交座標）
    ///
    /// 縮退時（目標が真上・同一点など）はゼロベクトルを返します。
    pub fn tangent_direction(pursuer: [f64; 3], target: [f64; 3]) -> Point3D {
        let [r_p, theta_p, phi_p] = pursuer;
        let p = spherical_to_cartesian(r_p, theta_p, phi_p);
        let t = spherical_to_cartesian(target[0], target[1], target[2]);

        let chord = t - p;
        let radial = chord.dot(&p) / (r_p * r_p);
        let tangent = chord - p * radial;

        let norm = tangent.magnitude();
        if norm < 1e-6 {
            Point3D::new(0.0, 0.0, 0.0)
        } else {
            tangent * (1.0 / norm)
        }
    }
}

/// トーラス座標系のヘルパー
pub mod torus {
    use crate::error::PursuitError;
    use crate::models::common::{math_utils, Point3D};

    /// トーラスの形状（主半径 R、副半径 r）
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct TorusShape {
        pub major_radius: f64,
        pub minor_radius: f64,
    }

    impl TorusShape {
        /// `R > r > 0` を満たさない形状は自己交差するため拒否します
        pub fn new(major_radius: f64, minor_radius: f64) -> Result<Self, PursuitError> {
            if !(minor_radius > 0.0 && major_radius > minor_radius) {
                return Err(PursuitError::invalid(format!(
                    "トーラスは R > r > 0 が必要です (R = {}, r = {})",
                    major_radius, minor_radius
                )));
            }
            Ok(Self {
                major_radius,
                minor_radius,
            })
        }

        /// u 方向の計量係数 `R + r·cos v`
        pub fn u_scale(&self, v: f64) -> f64 {
            self.major_radius + self.minor_radius * v.cos()
        }

        /// v 方向の計量係数 `r`
        pub fn v_scale(&self) -> f64 {
            self.minor_radius
        }

        /// `(u, v)` を直交座標に埋め込み
        pub fn to_cartesian(&self, u: f64, v: f64) -> Point3D {
            let ring = self.u_scale(v);
            Point3D::new(ring * u.cos(), ring * u.sin(), self.minor_radius * v.sin())
        }

        /// 計量 `ds² = (R + r cos v)² du² + r² dv²` に基づく距離
        ///
        /// 各角度差は最短の向きに取り、u 方向の計量係数は両端の平均を使うので
        /// `from` と `to` を入れ替えても値は変わりません。
        pub fn riemannian_distance(&self, from: [f64; 2], to: [f64; 2]) -> f64 {
            let du = math_utils::shortest_angular_distance(from[0], to[0]);
            let dv = math_utils::shortest_angular_distance(from[1], to[1]);
            let u_scale = 0.5 * (self.u_scale(from[1]) + self.u_scale(to[1]));
            ((u_scale * du).powi(2) + (self.v_scale() * dv).powi(2)).sqrt()
        }

        /// 接空間での目標方向の単位ベクトル `(t_u, t_v)`
        pub fn tangent_direction(&self, from: [f64; 2], to: [f64; 2]) -> [f64; 2] {
            let du = math_utils::shortest_angular_distance(from[0], to[0]);
            let dv = math_utils::shortest_angular_distance(from[1], to[1]);
            let d_u = self.u_scale(from[1]) * du;
            let d_v = self.v_scale() * dv;

            let norm = (d_u * d_u + d_v * d_v).sqrt();
            if norm < 1e-6 {
                [0.0, 0.0]
            } else {
                [d_u / norm, d_v / norm]
            }
        }

        /// 接ベクトルと速さから角速度 `(du/dt, dv/dt)` を求める
        pub fn tangent_to_angular_rates(&self, v: f64, tangent: [f64; 2], speed: f64) -> [f64; 2] {
            [
                speed * tangent[0] / self.u_scale(v),
                speed * tangent[1] / self.v_scale(),
            ]
        }
    }
}
