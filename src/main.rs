use clap::{Arg, ArgAction, Command};
use tracing::error;

use pursuit_sim::logging::{init_logging, level_from_verbosity, parse_log_level, LogConfig, LogOutput};
use pursuit_sim::scenario::{list_scenarios, RunReport, ScenarioConfig};
use pursuit_sim::simulation::DiscreteOutcome;

const DEFAULT_SCENARIO_DIR: &str = "scenarios";

fn main() {
    let matches = Command::new("pursuit-sim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("追跡曲線シミュレーター (Pursuit Curve Simulator)")
        .long_about(
            "追跡者が移動する目標を追う軌跡を計算します。\n\
             平面・空間・N次元空間・球面・トーラス上の追跡戦略を YAML シナリオで指定します。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定"),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .requires("scenario")
                .help("シナリオの情報のみ表示して終了"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .value_name("DIR")
                .num_args(0..=1)
                .default_missing_value(DEFAULT_SCENARIO_DIR)
                .conflicts_with("scenario")
                .help("シナリオディレクトリ内のシナリオ一覧を表示"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: トレース)"),
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .default_value("console")
                .help("ログ出力先 (console, file, both)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)。-v より優先"),
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");
    let output = match matches
        .get_one::<String>("log-output")
        .map(|s| s.parse::<LogOutput>())
        .unwrap_or(Ok(LogOutput::Console))
    {
        Ok(output) => output,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };
    let level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or_else(|| level_from_verbosity(verbose_level));

    let log_config = LogConfig {
        level,
        output,
        ..LogConfig::default()
    };
    if let Err(e) = init_logging(log_config) {
        eprintln!("ログ初期化エラー: {}", e);
    }

    if let Some(dir) = matches.get_one::<String>("list") {
        if let Err(e) = show_scenario_list(dir) {
            error!("{}", e);
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        return;
    }

    match matches.get_one::<String>("scenario") {
        Some(scenario_path) => {
            if let Err(e) = run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
                error!("{}", e);
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
        None => show_default_help(),
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    if verbose_level > 0 {
        scenario.print_summary();
        println!();
    }

    let mut run = scenario.build()?;
    let report = run.execute()?;
    print_report(&scenario.meta.name, &report);

    Ok(())
}

fn print_report(name: &str, report: &RunReport) {
    println!("=== 結果: {} ===", name);
    match report {
        RunReport::Discrete(DiscreteOutcome::Captured { steps, distance }) => {
            println!("{} ステップで目標を捕捉しました (距離 {:.4})", steps, distance);
        }
        RunReport::Discrete(DiscreteOutcome::Exhausted { steps }) => {
            println!("{} ステップ以内に目標を捕捉できませんでした", steps);
        }
        RunReport::Continuous(outcome) => {
            if outcome.captured {
                println!("t = {:.4} で目標を捕捉しました", outcome.final_time);
            } else {
                println!("t = {:.4} まで積分しました（捕捉なし）", outcome.final_time);
            }
            let stats = outcome.stats();
            println!(
                "時刻点: {}, 受理ステップ: {}, 棄却ステップ: {}, 導関数評価: {}",
                outcome.steps, stats.accepted_steps, stats.rejected_steps, stats.nfev
            );
            let state: Vec<String> = outcome
                .solution
                .final_state()
                .iter()
                .map(|v| format!("{:.4}", v))
                .collect();
            println!("最終状態: [{}]", state.join(", "));
        }
    }
}

/// シナリオ一覧を表示
fn show_scenario_list(dir: &str) -> Result<(), Box<dyn std::error::Error>> {
    let scenarios = list_scenarios(dir)?;
    println!("利用可能なシナリオ ({}):", dir);
    for (path, meta) in scenarios {
        println!("  {:<44} - {}", path.display(), meta.description);
    }
    Ok(())
}

/// デフォルトヘルプを表示
fn show_default_help() {
    println!("使用方法:");
    println!("  pursuit-sim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>    シナリオファイルを指定して実行");
    println!("  -i, --info               シナリオ情報のみ表示");
    println!("  -l, --list [DIR]         シナリオ一覧を表示 (既定: scenarios)");
    println!("  -v, --verbose            詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-output <TARGET> ログ出力先 (console, file, both)");
    println!("      --log-level <LEVEL>  ログレベル");
    println!("  -h, --help               このヘルプを表示");
    println!();
    println!("例:");
    println!("  pursuit-sim -s scenarios/discrete_proportional_navigation.yaml");
    println!("  pursuit-sim -s scenarios/lissajous_3d.yaml -v");
    println!("  pursuit-sim -s scenarios/cyclic_pursuit.yaml -i");
    println!("  pursuit-sim --list");
}
