//! # Scenario モジュール
//!
//! YAML で記述した1回分のシミュレーション設定（モード、戦略、目標の運動則、
//! 初期状態、ソルバー設定）を読み込み、検証し、実行可能なドライバーに組み立てます。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::error::PursuitError;
use crate::models::*;
use crate::simulation::{
    ContinuousConfig, ContinuousOutcome, ContinuousSimulation, DiscreteOutcome, DiscreteSimulation,
};
use crate::solver::SolverOptions;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// シナリオ設定全体
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub simulation: SimulationConfig,
}

/// モード別のシミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SimulationConfig {
    Discrete(DiscreteScenario),
    Continuous(ContinuousScenario),
}

/// 離散モードの設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscreteScenario {
    pub pursuer_start: [f64; 2],
    pub target_start: [f64; 2],
    pub pursuer_velocity: [f64; 2],
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
    pub strategy: DiscreteStrategyConfig,
    pub target: DiscreteTargetConfig,
}

fn default_max_iters() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscreteStrategyConfig {
    DirectPursuit,
    ConstantBearing {
        bearing_deg: f64,
    },
    ProportionalNavigation {
        #[serde(default = "default_navigation_constant")]
        navigation_constant: f64,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscreteTargetConfig {
    ConstantStep { velocity: [f64; 2] },
    Rotating { angular_velocity: f64, dt: f64 },
}

/// 連続モードの設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContinuousScenario {
    /// 省略時は巡回追跡の `radius` から円周配置を生成
    #[serde(default)]
    pub initial_state: Option<Vec<f64>>,
    #[serde(default = "default_t_span")]
    pub t_span: [f64; 2],
    #[serde(default)]
    pub solver: SolverSettings,
    pub strategy: StrategyConfig,
    /// 巡回追跡では不要
    #[serde(default)]
    pub target: Option<TargetConfig>,
}

fn default_t_span() -> [f64; 2] {
    [0.0, 50.0]
}

fn default_navigation_constant() -> f64 {
    ProportionalNavigation::DEFAULT_NAVIGATION_CONSTANT
}

/// ソルバー設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolverSettings {
    #[serde(default = "default_max_step")]
    pub max_step: f64,
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
}

fn default_max_step() -> f64 {
    0.1
}

fn default_rtol() -> f64 {
    1e-3
}

fn default_atol() -> f64 {
    1e-6
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_step: default_max_step(),
            rtol: default_rtol(),
            atol: default_atol(),
        }
    }
}

impl SolverSettings {
    fn to_options(&self) -> SolverOptions {
        SolverOptions {
            max_step: self.max_step,
            rtol: self.rtol,
            atol: self.atol,
            ..SolverOptions::default()
        }
    }
}

/// 連続モードの追跡戦略
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    DirectPursuit {
        speed: Vec<f64>,
        #[serde(default)]
        capture_radius: Option<f64>,
    },
    ConstantBearing {
        speed: [f64; 2],
        bearing_deg: f64,
        #[serde(default)]
        capture_radius: Option<f64>,
    },
    ProportionalNavigation {
        speed: [f64; 2],
        #[serde(default = "default_navigation_constant")]
        navigation_constant: f64,
        #[serde(default)]
        capture_radius: Option<f64>,
    },
    Cyclic {
        count: usize,
        speed: [f64; 2],
        #[serde(default)]
        radius: Option<f64>,
    },
    Sphere {
        speed: f64,
    },
    Torus {
        speed: f64,
        major_radius: f64,
        minor_radius: f64,
    },
}

impl StrategyConfig {
    pub fn label(&self) -> &'static str {
        match self {
            StrategyConfig::DirectPursuit { .. } => "直接追跡",
            StrategyConfig::ConstantBearing { .. } => "一定方位角追跡",
            StrategyConfig::ProportionalNavigation { .. } => "比例航法",
            StrategyConfig::Cyclic { .. } => "巡回追跡",
            StrategyConfig::Sphere { .. } => "球面上の直接追跡",
            StrategyConfig::Torus { .. } => "トーラス上の直接追跡",
        }
    }

    /// 状態ベクトルの長さ
    pub fn state_len(&self) -> usize {
        match self {
            StrategyConfig::DirectPursuit { speed, .. } => 2 * speed.len(),
            StrategyConfig::ConstantBearing { .. }
            | StrategyConfig::ProportionalNavigation { .. }
            | StrategyConfig::Torus { .. } => 4,
            StrategyConfig::Cyclic { count, .. } => 2 * count,
            StrategyConfig::Sphere { .. } => 6,
        }
    }

    fn needs_target(&self) -> bool {
        !matches!(self, StrategyConfig::Cyclic { .. })
    }
}

/// 連続モードの目標の運動則
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetConfig {
    Linear {
        velocity: Vec<f64>,
    },
    Circular {
        radius: f64,
        angular_velocity: f64,
    },
    Helix {
        radius: f64,
        angular_velocity: f64,
        vertical_velocity: f64,
    },
    Lissajous {
        amplitude: [f64; 3],
        angular_velocity: [f64; 3],
    },
    Sphere {
        dr: f64,
        dtheta: f64,
        dphi: f64,
    },
    Torus {
        omega_u: f64,
        omega_v: f64,
    },
}

impl TargetConfig {
    pub fn label(&self) -> &'static str {
        match self {
            TargetConfig::Linear { .. } => "等速直線運動",
            TargetConfig::Circular { .. } => "円運動",
            TargetConfig::Helix { .. } => "螺旋運動",
            TargetConfig::Lissajous { .. } => "リサージュ運動",
            TargetConfig::Sphere { .. } => "球面上の等速運動",
            TargetConfig::Torus { .. } => "トーラス上の等速運動",
        }
    }

    fn build(&self) -> Result<Box<dyn ITargetMotion>, PursuitError> {
        let target: Box<dyn ITargetMotion> = match self {
            TargetConfig::Linear { velocity } => {
                Box::new(LinearTarget::new(PointND::new(velocity.clone())?))
            }
            TargetConfig::Circular {
                radius,
                angular_velocity,
            } => Box::new(CircularTarget::new(*radius, *angular_velocity)),
            TargetConfig::Helix {
                radius,
                angular_velocity,
                vertical_velocity,
            } => Box::new(HelixTarget::new(*radius, *angular_velocity, *vertical_velocity)),
            TargetConfig::Lissajous {
                amplitude: [ax, ay, az],
                angular_velocity: [wx, wy, wz],
            } => Box::new(LissajousTarget::new(
                Point3D::new(*ax, *ay, *az),
                Point3D::new(*wx, *wy, *wz),
            )),
            TargetConfig::Sphere { dr, dtheta, dphi } => {
                Box::new(SphereTarget::new(*dr, *dtheta, *dphi))
            }
            TargetConfig::Torus { omega_u, omega_v } => {
                Box::new(TorusTarget::new(*omega_u, *omega_v))
            }
        };
        Ok(target)
    }
}

fn point2(v: [f64; 2]) -> Point2D {
    Point2D::new(v[0], v[1])
}

/// 組み立て済みの実行可能なシミュレーション
#[derive(Debug)]
pub enum ScenarioRun {
    Discrete(DiscreteSimulation),
    Continuous {
        simulation: ContinuousSimulation,
        strategy: Box<dyn IPursuitStrategy>,
        initial_state: Vec<f64>,
    },
}

/// 実行結果
#[derive(Debug, Clone)]
pub enum RunReport {
    Discrete(DiscreteOutcome),
    Continuous(ContinuousOutcome),
}

impl ScenarioRun {
    pub fn execute(&mut self) -> Result<RunReport, PursuitError> {
        match self {
            ScenarioRun::Discrete(simulation) => Ok(RunReport::Discrete(simulation.run())),
            ScenarioRun::Continuous {
                simulation,
                strategy,
                initial_state,
            } => simulation
                .run(strategy.as_mut(), initial_state)
                .map(RunReport::Continuous),
        }
    }
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;
        debug!(path = %path.display(), name = %config.meta.name, "SCENARIO_LOADED");

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        match &self.simulation {
            SimulationConfig::Discrete(discrete) => {
                let values = discrete
                    .pursuer_start
                    .iter()
                    .chain(&discrete.target_start)
                    .chain(&discrete.pursuer_velocity);
                if values.into_iter().any(|v| !v.is_finite()) {
                    return Err(validation("離散モードの位置・速度に非有限値が含まれます"));
                }
                if let DiscreteTargetConfig::Rotating { dt, .. } = discrete.target {
                    if !(dt > 0.0) {
                        return Err(validation(format!("dt は正である必要があります: {}", dt)));
                    }
                }
            }
            SimulationConfig::Continuous(continuous) => {
                let [t0, t1] = continuous.t_span;
                if !(t0.is_finite() && t1.is_finite() && t1 > t0) {
                    return Err(validation(format!("t_span が不正です: [{}, {}]", t0, t1)));
                }
                if !(continuous.solver.max_step > 0.0) {
                    return Err(validation("max_step は正である必要があります"));
                }

                let strategy = &continuous.strategy;
                match (strategy.needs_target(), continuous.target.is_some()) {
                    (true, false) => {
                        return Err(validation(format!(
                            "{}には target の指定が必要です",
                            strategy.label()
                        )));
                    }
                    (false, true) => {
                        return Err(validation("巡回追跡では target を指定できません"));
                    }
                    _ => {}
                }

                match (&continuous.initial_state, strategy) {
                    (Some(state), _) if state.len() != strategy.state_len() => {
                        return Err(validation(format!(
                            "initial_state の長さが {} ではありません（{}）: {}",
                            strategy.state_len(),
                            strategy.label(),
                            state.len()
                        )));
                    }
                    (None, StrategyConfig::Cyclic { radius: Some(_), .. }) => {}
                    (None, _) => {
                        return Err(validation("initial_state が指定されていません"));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// 実行可能なシミュレーションを組み立てる
    pub fn build(&self) -> Result<ScenarioRun, ScenarioError> {
        match &self.simulation {
            SimulationConfig::Discrete(discrete) => Ok(ScenarioRun::Discrete(build_discrete(discrete)?)),
            SimulationConfig::Continuous(continuous) => build_continuous(continuous),
        }
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        if !self.meta.description.is_empty() {
            println!("説明: {}", self.meta.description);
        }
        println!("バージョン: {}", self.meta.version);
        println!();

        match &self.simulation {
            SimulationConfig::Discrete(discrete) => {
                println!("=== 離散シミュレーション ===");
                println!("追跡者の初期位置: {:?}", discrete.pursuer_start);
                println!("目標の初期位置: {:?}", discrete.target_start);
                println!("追跡者の速さ: {:?}", discrete.pursuer_velocity);
                println!("最大ステップ数: {}", discrete.max_iters);
                println!("戦略: {:?}", discrete.strategy);
                println!("目標: {:?}", discrete.target);
            }
            SimulationConfig::Continuous(continuous) => {
                println!("=== 連続シミュレーション ===");
                println!("戦略: {}", continuous.strategy.label());
                if let Some(target) = &continuous.target {
                    println!("目標: {}", target.label());
                }
                println!("状態ベクトル長: {}", continuous.strategy.state_len());
                println!(
                    "時間区間: [{:.1}, {:.1}]",
                    continuous.t_span[0], continuous.t_span[1]
                );
                println!(
                    "ソルバー: max_step = {}, rtol = {:e}, atol = {:e}",
                    continuous.solver.max_step, continuous.solver.rtol, continuous.solver.atol
                );
            }
        }
    }
}

fn validation(msg: impl Into<String>) -> ScenarioError {
    ScenarioError::ValidationError(msg.into())
}

fn build_discrete(discrete: &DiscreteScenario) -> Result<DiscreteSimulation, PursuitError> {
    let strategy: Box<dyn IDiscreteStrategy> = match discrete.strategy {
        DiscreteStrategyConfig::DirectPursuit => Box::new(DiscreteDirectPursuit::new()),
        DiscreteStrategyConfig::ConstantBearing { bearing_deg } => {
            Box::new(DiscreteConstantBearing::new(bearing_deg)?)
        }
        DiscreteStrategyConfig::ProportionalNavigation {
            navigation_constant,
        } => Box::new(DiscreteProportionalNavigation::new(navigation_constant)?),
    };
    let target: Box<dyn IDiscreteTargetMotion> = match discrete.target {
        DiscreteTargetConfig::ConstantStep { velocity } => {
            Box::new(ConstantStepTarget::new(point2(velocity)))
        }
        DiscreteTargetConfig::Rotating {
            angular_velocity,
            dt,
        } => Box::new(RotatingTarget::new(angular_velocity, dt)),
    };

    Ok(DiscreteSimulation::new(
        point2(discrete.pursuer_start),
        point2(discrete.target_start),
        point2(discrete.pursuer_velocity),
        strategy,
        target,
        discrete.max_iters,
    ))
}

fn build_continuous(continuous: &ContinuousScenario) -> Result<ScenarioRun, ScenarioError> {
    let target = continuous.target.as_ref().map(TargetConfig::build).transpose()?;
    let require_target = || {
        target.ok_or_else(|| validation("target が指定されていません"))
    };

    let strategy: Box<dyn IPursuitStrategy> = match &continuous.strategy {
        StrategyConfig::DirectPursuit {
            speed,
            capture_radius,
        } => {
            let strategy = DirectPursuit::new(PointND::new(speed.clone())?, require_target()?)?;
            match capture_radius {
                Some(radius) => Box::new(strategy.with_capture_radius(*radius)?),
                None => Box::new(strategy),
            }
        }
        StrategyConfig::ConstantBearing {
            speed,
            bearing_deg,
            capture_radius,
        } => {
            let strategy = ConstantBearing::new(point2(*speed), require_target()?, *bearing_deg)?;
            match capture_radius {
                Some(radius) => Box::new(strategy.with_capture_radius(*radius)?),
                None => Box::new(strategy),
            }
        }
        StrategyConfig::ProportionalNavigation {
            speed,
            navigation_constant,
            capture_radius,
        } => {
            let strategy =
                ProportionalNavigation::new(point2(*speed), require_target()?, *navigation_constant)?;
            match capture_radius {
                Some(radius) => Box::new(strategy.with_capture_radius(*radius)?),
                None => Box::new(strategy),
            }
        }
        StrategyConfig::Cyclic { count, speed, .. } => {
            Box::new(CyclicPursuit::new(*count, point2(*speed))?)
        }
        StrategyConfig::Sphere { speed } => Box::new(SphericalPursuit::new(*speed, require_target()?)?),
        StrategyConfig::Torus {
            speed,
            major_radius,
            minor_radius,
        } => {
            let shape = TorusShape::new(*major_radius, *minor_radius)?;
            Box::new(ToroidalPursuit::new(*speed, shape, require_target()?)?)
        }
    };

    let initial_state = match (&continuous.initial_state, &continuous.strategy) {
        (Some(state), _) => state.clone(),
        (None, StrategyConfig::Cyclic {
            count,
            radius: Some(radius),
            ..
        }) => circle_formation(*count, *radius),
        (None, _) => return Err(validation("initial_state が指定されていません")),
    };

    let config = ContinuousConfig {
        t_span: (continuous.t_span[0], continuous.t_span[1]),
        options: continuous.solver.to_options(),
    };

    Ok(ScenarioRun::Continuous {
        simulation: ContinuousSimulation::new(config),
        strategy,
        initial_state,
    })
}

/// ディレクトリ内のシナリオファイル（.yaml / .yml）を名前順に列挙
pub fn list_scenarios<P: AsRef<Path>>(dir: P) -> Result<Vec<(PathBuf, ScenarioMeta)>, ScenarioError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(ScenarioError::FileNotFound(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|e| ScenarioError::IoError(dir.to_path_buf(), e))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| ScenarioConfig::from_file(&path).map(|config| (path, config.meta)))
        .collect()
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),

    #[error("YAML解析エラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("設定検証エラー: {0}")]
    ValidationError(String),

    #[error("シミュレーション構築エラー: {0}")]
    Build(#[from] PursuitError),
}
