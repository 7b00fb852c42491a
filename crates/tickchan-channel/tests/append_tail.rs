use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tickchan_channel::{stat_channel, ChannelError, ChannelReader, ChannelWriter};

#[test]
fn reader_sees_only_records_after_open() {
    let dir = tempfile::tempdir().expect("temp dir should be creatable");
    let path = dir.path().join("chan.bin");
    let mut writer = ChannelWriter::open(&path, 3).expect("writer should open");

    // M records before the reader exists.
    for i in 0..7 {
        let v = -(i as f32) - 1.0;
        writer.write(&[v, v, v]).expect("write should succeed");
    }

    let mut reader = ChannelReader::open(&path, 3).expect("reader should open");
    let mut observed = Vec::new();

    // K records, one poll after each.
    for i in 0..5 {
        let v = i as f32;
        writer.write(&[v, v + 0.25, v + 0.5]).expect("write should succeed");
        let record = reader
            .poll()
            .expect("poll should succeed")
            .expect("each append should be observed");
        observed.push(record.into_samples());
    }

    let expected: Vec<Vec<f32>> = (0..5)
        .map(|i| {
            let v = i as f32;
            vec![v, v + 0.25, v + 0.5]
        })
        .collect();
    assert_eq!(observed, expected);
    assert!(observed.iter().flatten().all(|v| *v >= 0.0));
}

#[test]
fn file_length_is_records_times_record_size() {
    let dir = tempfile::tempdir().expect("temp dir should be creatable");
    let path = dir.path().join("chan.bin");

    for channel_count in [1usize, 2, 5] {
        let _ = std::fs::remove_file(&path);
        let mut writer = ChannelWriter::open(&path, channel_count).expect("writer should open");
        let samples = vec![1.5f32; channel_count];
        for _ in 0..13 {
            writer.write(&samples).expect("write should succeed");
        }
        writer.close();

        let (stat, last) = stat_channel(&path, channel_count).expect("stat should succeed");
        assert_eq!(stat.length, (13 * channel_count * 4) as u64);
        assert_eq!(stat.complete_records, 13);
        assert!(stat.is_aligned());
        assert_eq!(last.expect("last record").samples(), samples.as_slice());
    }
}

#[test]
fn concrete_two_channel_scenario() {
    let dir = tempfile::tempdir().expect("temp dir should be creatable");
    let path = dir.path().join("chan.bin");
    let mut writer = ChannelWriter::open(&path, 2).expect("writer should open");
    let mut early = ChannelReader::open(&path, 2).expect("reader should open");

    let ticks = [[1.0, 0.5], [2.0, 1.0], [3.0, 1.5]];
    for tick in ticks {
        writer.write(&tick).expect("write should succeed");
        let record = early.poll().expect("poll").expect("new record");
        assert_eq!(record.samples(), &tick);
    }

    let mut late = ChannelReader::open(&path, 2).expect("reader should open");
    assert_eq!(late.poll().expect("poll"), None);
}

#[test]
fn crashed_writer_tail_reports_truncation() {
    let dir = tempfile::tempdir().expect("temp dir should be creatable");
    let path = dir.path().join("chan.bin");
    let mut writer = ChannelWriter::open(&path, 2).expect("writer should open");
    writer.write(&[1.0, 0.5]).expect("write should succeed");
    writer.close();

    // Half a record left behind by a crashed writer.
    let mut bytes = std::fs::read(&path).expect("read channel");
    bytes.extend_from_slice(&[0u8; 4]);
    std::fs::write(&path, &bytes).expect("rewrite channel");

    let mut reader = ChannelReader::open(&path, 2).expect("reader should open");
    let mut writer = ChannelWriter::open(&path, 2).expect("writer should reopen");
    writer.write(&[2.0, 1.0]).expect("write should succeed");

    let err = reader.poll().expect_err("misaligned growth must not decode");
    assert!(matches!(err, ChannelError::TruncatedChannel { .. }));
}

#[test]
fn concurrent_writer_and_reader_threads() {
    let dir = tempfile::tempdir().expect("temp dir should be creatable");
    let path = dir.path().join("chan.bin");
    let mut writer = ChannelWriter::open(&path, 4).expect("writer should open");
    let mut reader = ChannelReader::open(&path, 4).expect("reader should open");

    let done = Arc::new(AtomicBool::new(false));
    let reader_thread = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut seen = Vec::new();
            loop {
                let finished = done.load(Ordering::SeqCst);
                match reader.poll() {
                    Ok(Some(record)) => seen.push(record.into_samples()),
                    Ok(None) => {}
                    Err(err) if err.is_transient() => {}
                    Err(err) => panic!("poll failed: {err}"),
                }
                if finished {
                    break;
                }
                thread::sleep(Duration::from_micros(200));
            }
            seen
        })
    };

    for tick in 0..500u32 {
        let v = tick as f32;
        writer
            .write(&[v, v * 2.0, v * 3.0, v * 4.0])
            .expect("write should succeed");
    }
    done.store(true, Ordering::SeqCst);

    let seen = reader_thread.join().expect("reader thread should finish");
    assert!(!seen.is_empty());

    // Every observed record is whole and strictly newer than the previous one.
    let mut last = -1.0f32;
    for samples in &seen {
        let v = samples[0];
        assert_eq!(samples.as_slice(), &[v, v * 2.0, v * 3.0, v * 4.0]);
        assert!(v > last);
        last = v;
    }
    assert_eq!(last, 499.0);
}
