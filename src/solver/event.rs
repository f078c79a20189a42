//! 終了イベント（ゼロ交差）の記述と根の探索

/// ゼロ交差の向き
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingDirection {
    /// 負から正へ
    Increasing,
    /// 正から負へ
    Decreasing,
    /// どちらの向きでも
    Either,
}

impl CrossingDirection {
    /// ステップ前後のイベント値 `before` → `after` がこの向きの交差かどうか
    pub fn is_crossing(self, before: f64, after: f64) -> bool {
        let up = before < 0.0 && after >= 0.0;
        let down = before > 0.0 && after <= 0.0;
        match self {
            CrossingDirection::Increasing => up,
            CrossingDirection::Decreasing => down,
            CrossingDirection::Either => up || down,
        }
    }
}

/// ソルバーが監視するイベント関数
pub trait EventFunction {
    /// イベント値（符号の変化がイベント）
    fn evaluate(&self, t: f64, y: &[f64]) -> f64;

    /// 検出時に積分を打ち切るか
    fn is_terminal(&self) -> bool;

    /// 検出対象の交差の向き
    fn direction(&self) -> CrossingDirection;
}

/// 検出されたイベント
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub t: f64,
    pub y: Vec<f64>,
}

const BRENT_MAX_ITER: usize = 100;

/// Brent 法で `[a, b]` 内の根を探す（`fa`, `fb` は異符号または片方がゼロ）
pub(crate) fn brent_root(
    f: impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    fa: f64,
    fb: f64,
    tol: f64,
) -> f64 {
    if fa == 0.0 {
        return a;
    }
    if fb == 0.0 {
        return b;
    }

    let (mut a, mut b, mut fa, mut fb) = (a, b, fa, fb);
    let (mut c, mut fc) = (b, fb);
    let mut d = b - a;
    let mut e = d;

    for _ in 0..BRENT_MAX_ITER {
        if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return b;
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // 逆二次補間（a == c のときは割線法）
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q0 = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q0 * (q0 - r) - (b - a) * (r - 1.0)),
                    (q0 - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
        fb = f(b);
    }

    b
}
