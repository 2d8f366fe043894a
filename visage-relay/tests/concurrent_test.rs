//! Concurrent access tests for the frame slot

use std::sync::Arc;
use std::thread;
use visage_core::{MocapFrame, PoseParam, PoseVector};
use visage_relay::FrameReceiver;

/// Every parameter set to `k`, stamped with `t = k`
fn uniform_frame(k: f64) -> MocapFrame {
    let mut pose = PoseVector::neutral();
    for param in PoseParam::ALL {
        pose[param] = k;
    }
    MocapFrame::new(k, pose)
}

fn assert_whole(frame: &MocapFrame) {
    for (param, value) in frame.pose.iter() {
        assert_eq!(value, frame.t, "{} torn: {} vs t {}", param, value, frame.t);
    }
}

#[test]
fn test_two_writers_one_read() {
    let receiver = Arc::new(FrameReceiver::default());
    let mut handles = vec![];

    for writer in 0..2 {
        let receiver = receiver.clone();
        handles.push(thread::spawn(move || {
            for i in 0..5_000 {
                receiver.push(uniform_frame((writer * 10_000 + i) as f64 + 1.0));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let frame = receiver.latest();
    assert_whole(&frame);
    assert!(frame.t == 5_000.0 || frame.t == 15_000.0);
}

#[test]
fn test_readers_never_see_mixed_frames() {
    let receiver = Arc::new(FrameReceiver::default());
    let mut handles = vec![];

    for writer in 0..4 {
        let receiver = receiver.clone();
        handles.push(thread::spawn(move || {
            for i in 0..2_000 {
                receiver.push(uniform_frame((writer * 100_000 + i) as f64));
            }
        }));
    }

    let reader = {
        let receiver = receiver.clone();
        thread::spawn(move || {
            let mut seen = 0;
            for _ in 0..20_000 {
                let frame = receiver.latest();
                if frame.t != 0.0 {
                    assert_whole(&frame);
                    seen += 1;
                }
            }
            seen
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    reader.join().unwrap();
    assert_whole(&receiver.latest());
}

#[tokio::test]
async fn test_latest_is_always_defined() {
    let receiver = Arc::new(FrameReceiver::default());
    let mut tasks = vec![];
    for _ in 0..8 {
        let receiver = receiver.clone();
        tasks.push(tokio::spawn(async move {
            let frame = receiver.latest();
            frame.pose[PoseParam::FaceScale]
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), 1.0);
    }
}
