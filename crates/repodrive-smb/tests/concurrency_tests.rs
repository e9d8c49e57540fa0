//! Concurrency tests for the repository disk interface.
//!
//! The protocol server calls in from many threads at once, one session per
//! client. Handles are never shared; the interface and context provider are.

mod common;

use common::{README, TestDrive, assert_file_content};
use repodrive_core::{ADMIN_USER, Permissions};
use repodrive_smb::{DiskInterface, OpenParams, SearchAttributes, Session};
use std::thread;

const THREADS: u64 = 8;
const FILES_PER_THREAD: usize = 10;

#[test]
fn test_parallel_sessions_create_distinct_files() {
    let drive = TestDrive::new();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let disk = &drive.disk;
            scope.spawn(move || {
                let session = Session::new(100 + t, ADMIN_USER);
                for i in 0..FILES_PER_THREAD {
                    let path = format!(r"\docs\t{t}-{i}.txt");
                    let content = format!("thread {t} file {i}");
                    let mut file = disk
                        .create_file(&session, &OpenParams::new(path.as_str()))
                        .unwrap();
                    disk.write_file(&session, &mut file, content.as_bytes(), 0, content.len(), 0)
                        .unwrap();
                    disk.close_file(&session, &mut file).unwrap();
                }
            });
        }
    });

    assert_eq!(drive.contexts.active_sessions(), THREADS as usize);
    let created = drive.search_names(r"\docs\t*-*.txt", SearchAttributes::everything());
    assert_eq!(created.len(), THREADS as usize * FILES_PER_THREAD);
    assert_file_content(&drive, r"\docs\t3-7.txt", b"thread 3 file 7");
}

#[test]
fn test_parallel_readers_share_nothing_but_the_repository() {
    let drive = TestDrive::new();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let disk = &drive.disk;
            scope.spawn(move || {
                let session = Session::new(200 + t, ADMIN_USER);
                let mut file = disk
                    .open_file(&session, &OpenParams::new(r"\docs\readme.txt"))
                    .unwrap();
                let mut buf = [0u8; 11];
                let read = disk
                    .read_file(&session, &mut file, &mut buf, 0, README.len(), 0)
                    .unwrap();
                assert_eq!(read, Some(README.len()));
                assert_eq!(&buf, README);
                disk.close_file(&session, &mut file).unwrap();
            });
        }
    });

    assert_eq!(drive.counting.content_reads(), THREADS as usize);
    assert_eq!(drive.counting.content_writes(), 0);
}

#[test]
fn test_contended_writers_serialise_through_locks() {
    let drive = TestDrive::new();
    let users: Vec<Session> = (0..THREADS)
        .map(|t| {
            drive.user_session(
                300 + t,
                &format!("writer{t}"),
                Permissions::VIEW | Permissions::READ | Permissions::WRITE,
            )
        })
        .collect();

    let outcomes: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = users
            .iter()
            .map(|session| {
                let disk = &drive.disk;
                scope.spawn(move || {
                    let mut file = disk
                        .open_file(session, &OpenParams::new(r"\docs\readme.txt"))
                        .unwrap();
                    disk.write_file(session, &mut file, b"X", 0, 1, 0).unwrap();
                    // A lock conflict leaves the buffer dirty; the close retries
                    let flushed = disk.flush_file(session, &mut file).is_ok();
                    while disk.close_file(session, &mut file).is_err() {
                        thread::yield_now();
                    }
                    flushed
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(outcomes.iter().any(|&flushed| flushed));
    assert_file_content(&drive, r"\docs\readme.txt", b"Xello world");
}
