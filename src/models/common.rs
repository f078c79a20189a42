use std::ops::{Add, Mul, Sub};

use crate::error::PursuitError;

/// 2次元の点（平面上の位置・速度・移動量に共用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// 原点からの距離
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 2点間の距離
    pub fn distance(&self, other: &Point2D) -> f64 {
        (*other - *self).magnitude()
    }

    /// 原点から見た角度（ラジアン）
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Add for Point2D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// 3次元の点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// 3次元距離を計算
    pub fn distance(&self, other: &Point3D) -> f64 {
        (*other - *self).magnitude()
    }

    pub fn dot(&self, other: &Point3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Point3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Point3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// 任意次元の点
///
/// 次元は構築時に固定され、以後変わりません。次元の異なる点同士の演算は
/// 切り詰めやゼロ埋めをせずにエラーになります。
#[derive(Debug, Clone, PartialEq)]
pub struct PointND {
    coordinates: Vec<f64>,
}

impl PointND {
    /// 座標列から点を作成（空の座標列は不正）
    pub fn new(coordinates: Vec<f64>) -> Result<Self, PursuitError> {
        if coordinates.is_empty() {
            return Err(PursuitError::invalid("PointND には少なくとも1つの座標が必要です"));
        }
        Ok(Self { coordinates })
    }

    pub fn dim(&self) -> usize {
        self.coordinates.len()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.coordinates.clone()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.coordinates
    }

    pub fn checked_add(&self, other: &PointND) -> Result<PointND, PursuitError> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn checked_sub(&self, other: &PointND) -> Result<PointND, PursuitError> {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with(
        &self,
        other: &PointND,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<PointND, PursuitError> {
        crate::error::ensure_len("PointND", self.dim(), other.dim())?;
        Ok(PointND {
            coordinates: self
                .coordinates
                .iter()
                .zip(&other.coordinates)
                .map(|(a, b)| op(*a, *b))
                .collect(),
        })
    }
}

impl From<Point2D> for PointND {
    fn from(p: Point2D) -> Self {
        Self {
            coordinates: vec![p.x, p.y],
        }
    }
}

impl From<Point3D> for PointND {
    fn from(p: Point3D) -> Self {
        Self {
            coordinates: vec![p.x, p.y, p.z],
        }
    }
}

/// 数学ユーティリティ関数
pub mod math_utils {
    use std::f64::consts::PI;

    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / PI
    }

    /// 角度を (-π, π] に正規化
    pub fn wrap_angle(angle: f64) -> f64 {
        let wrapped = angle.sin().atan2(angle.cos());
        // atan2 は -π を返しうるので π 側に寄せる
        if wrapped <= -PI { PI } else { wrapped }
    }

    /// `from` から `to` への最短の符号付き角度差 (-π, π]
    pub fn shortest_angular_distance(from: f64, to: f64) -> f64 {
        wrap_angle(to - from)
    }

    /// ユークリッドノルム
    pub fn norm(v: &[f64]) -> f64 {
        v.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// 同じ長さの2つの座標列の間のユークリッド距離
    pub fn distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(p, q)| (q - p).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}
