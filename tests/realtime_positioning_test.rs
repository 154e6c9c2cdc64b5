/// 🎯 实时跟踪演示
///
/// 功能：
/// - 模拟三个移动节点周期性上报 RSSI
/// - 定位任务串行处理报告，输出位置、区域和告警
/// - 节点 1 和节点 3 同属一个家庭，互不告警
///
/// 信标配置：参考部署（A E F G P Z 六个主信标）
///
/// RSSI 模型：
/// - 参考功率 = -59 dBm
/// - 路径损耗指数 = 4

use blutrack::algorithms::*;
use blutrack::report::AnchorReading;
use blutrack::stream::{self, SharedEngine};
use blutrack::{EntityId, PositionEngine, RssiReport, TrackerConfig, TrackerEvent};
use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration, Instant};

/// 各节点每轮所在的区域
const ROUTES: [(EntityId, [ZoneId; 4]); 3] = [
    (1, [1, 2, 3, 4]),
    (2, [8, 6, 5, 4]),
    (3, [1, 2, 3, 4]),
];

/// 在真实位置生成一条报告：取最近的三个主信标，按距离由近到远排列
fn simulate_report(
    anchors: &AnchorTable,
    model: &SignalModel,
    entity_id: EntityId,
    truth: Point2,
) -> RssiReport {
    let mut nearest: Vec<&Anchor> = anchors.iter().filter(|a| a.is_primary()).collect();
    nearest.sort_by(|a, b| {
        a.position()
            .distance_to(&truth)
            .total_cmp(&b.position().distance_to(&truth))
    });

    let readings: Vec<AnchorReading> = nearest
        .iter()
        .take(3)
        .map(|a| AnchorReading::new(a.label.clone(), model.rssi_at(a.position().distance_to(&truth))))
        .collect();

    RssiReport::new(
        entity_id,
        [readings[0].clone(), readings[1].clone(), readings[2].clone()],
        0,
        Heading::North,
    )
}

/// 用各区域中心的模拟报告训练最近邻模型
fn build_engine(config: &TrackerConfig) -> SharedEngine {
    let anchors = config.anchor_table();
    let samples = config
        .zones
        .iter()
        .map(|zone| LabeledSample {
            zone: zone.id,
            features: simulate_report(&anchors, &config.signal_model, 0, zone.coordinate)
                .features()
                .encode()
                .unwrap(),
        })
        .collect();

    let model = KnnZoneModel::from_samples(1, samples).unwrap();
    let classifier = ZoneClassifier::new(Box::new(model), config.zone_coordinates()).unwrap();
    let exemptions = config.exemption_groups().unwrap();
    stream::shared(PositionEngine::new(config, classifier, exemptions))
}

fn format_signal_level(rssi: f64) -> &'static str {
    match rssi {
        r if r > -60.0 => "▓▓▓▓▓ 极强",
        r if r > -70.0 => "▓▓▓▓░ 强",
        r if r > -80.0 => "▓▓▓░░ 中",
        r if r > -90.0 => "▓▓░░░ 弱",
        _ => "▓░░░░ 极弱",
    }
}

fn print_report(result_no: usize, report: &RssiReport, events: &[TrackerEvent], elapsed: Duration) {
    println!(
        "📍 报告 #{} | 节点 {} | 运行时间: {}s {}ms",
        result_no,
        report.entity_id,
        elapsed.as_secs(),
        elapsed.subsec_millis()
    );
    println!("├─ 信号信息");
    for reading in &report.readings {
        println!(
            "│  {:>7}: {:>8.2} dBm {}",
            reading.label,
            reading.rssi,
            format_signal_level(reading.rssi)
        );
    }
    println!("├─ 事件");
    for event in events {
        let marker = if event.is_alert() { "⚠️ " } else { "" };
        println!("│  {}{}", marker, event);
    }
    println!("└─ 时间: {}", Local::now().format("%H:%M:%S%.3f"));
}

async fn simulated_report_source(config: TrackerConfig, tx: mpsc::Sender<RssiReport>) {
    println!("📡 [信号线程] 启动模拟节点...\n");

    let anchors = config.anchor_table();
    let zones = config.zone_coordinates();

    for round in 0..4 {
        for (entity_id, route) in ROUTES {
            let truth = zones.get(route[round]).unwrap().coordinate;
            let report = simulate_report(&anchors, &config.signal_model, entity_id, truth);
            if tx.send(report).await.is_err() {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    println!("\n📡 [信号线程] 报告序列发送完成");
}

async fn realtime_tracking_task(
    engine: SharedEngine,
    mut rx: mpsc::Receiver<RssiReport>,
) -> Vec<TrackerEvent> {
    println!("\n🎯 [定位线程] 启动实时跟踪...\n");

    let start_time = Instant::now();
    let mut all_events = Vec::new();
    let mut count = 0;

    while let Some(report) = rx.recv().await {
        let outcome = engine.lock().await.process(&report);
        count += 1;
        print_report(count, &report, &outcome.events, start_time.elapsed());
        all_events.extend(outcome.events);
    }

    println!("\n✓ 定位线程已停止");
    all_events
}

#[tokio::test]
async fn test_realtime_tracking() {
    println!("\n");
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  🎯 蓝牙室内实时跟踪                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");

    let config = TrackerConfig::builder()
        .exemption_group(vec![1, 3])
        .build()
        .unwrap();

    println!("\n📋 系统配置信息:");
    println!("├─ 信标: {} 个", config.anchors.len());
    println!("├─ 区域: {} 个", config.zones.len());
    println!("├─ RSSI 模型: {}", config.signal_model);
    println!("└─ 接近阈值: {:.1}\n", config.proximity_threshold);

    let engine = build_engine(&config);
    let (tx, rx) = mpsc::channel(16);

    let source = tokio::spawn(simulated_report_source(config.clone(), tx));
    let tracker = tokio::spawn(realtime_tracking_task(engine.clone(), rx));
    let (source, tracker) = tokio::join!(source, tracker);
    source.unwrap();
    let events = tracker.unwrap();

    // 每条报告都定位成功
    let updates = events
        .iter()
        .filter(|e| matches!(e, TrackerEvent::PositionUpdated { .. }))
        .count();
    assert_eq!(updates, 12);

    // 家庭成员之间没有告警，最后一轮在区域 4 相遇的节点两两告警
    let pairs: Vec<_> = events.iter().filter_map(TrackerEvent::pair).collect();
    assert!(!pairs.contains(&(1, 3)));
    assert!(pairs.contains(&(1, 2)));
    assert!(pairs.contains(&(2, 3)));

    let engine = engine.lock().await;
    for state in engine.snapshot() {
        let zone = state.zone.expect("每个节点都应已分类");
        assert_eq!(zone.id, 4, "节点 {} 应在区域 4", state.entity_id);
        assert!(state.position.distance_to(&Point2::new(18.0, 8.5)) < 1e-6);
    }

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                        ✓ 测试完成                            ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

#[tokio::test]
async fn test_zone_path_matches_route() {
    let config = TrackerConfig::default();
    let engine = build_engine(&config);
    let anchors = config.anchor_table();

    // 区域中心的报告应分类到该区域
    for zone in config.zone_coordinates().iter() {
        let report = simulate_report(&anchors, &config.signal_model, 7, zone.coordinate);
        let outcome = engine.lock().await.process(&report);
        let state = engine.lock().await.track(7).cloned().unwrap();
        assert_eq!(state.zone, Some(zone), "{:?}", outcome);
    }
}
