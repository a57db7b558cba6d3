use cotask::Task;
use std::cell::Cell;
use std::rc::Rc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn count(counter: Rc<Cell<u32>>, n: u32) -> Task {
    Task::new(move |co| async move {
        for _ in 0..n {
            counter.set(counter.get() + 1);
            co.suspend().await;
        }
        Ok(())
    })
}

#[test]
fn test_counter_reaches_n_after_n_resumes() {
    init_logger();
    let counter = Rc::new(Cell::new(0));
    let mut task = count(counter.clone(), 4);

    for expected in 1..=4 {
        task.resume().unwrap();
        assert_eq!(counter.get(), expected, "one increment per resume");
        assert!(!task.done(), "task is parked after its last increment");
    }

    task.resume().unwrap();
    assert!(task.done(), "task should finish once its loop ends");
    assert_eq!(counter.get(), 4);
}

#[test]
fn test_empty_task_is_done_without_resume() {
    let task = Task::empty();
    assert!(task.done());
    assert_eq!(task.depth(), 0);

    let task = Task::default();
    assert!(task.done(), "default task has an empty body");
}

#[test]
fn test_new_task_does_not_run_until_resumed() {
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();

    let mut task = Task::new(move |_co| async move {
        flag.set(true);
        Ok(())
    });

    assert!(!ran.get(), "body must not run on creation");
    assert!(!task.done());
    assert_eq!(task.depth(), 1);

    task.resume().unwrap();
    assert!(ran.get());
    assert!(task.done());
}

#[test]
fn test_plain_suspension_keeps_depth() {
    let counter = Rc::new(Cell::new(0));
    let mut task = count(counter, 3);

    task.resume().unwrap();
    task.resume().unwrap();
    assert_eq!(task.depth(), 1, "plain suspension does not alter the chain");
}

#[test]
#[should_panic(expected = "resumed a task that is already done")]
fn test_resume_done_task_panics() {
    let mut task = Task::new(|_co| async move { Ok(()) });
    task.resume().unwrap();
    assert!(task.done());

    let _ = task.resume();
}

#[test]
#[should_panic(expected = "resumed a task that is already done")]
fn test_resume_empty_task_panics() {
    let mut task = Task::empty();
    let _ = task.resume();
}

struct DropFlag(Rc<Cell<bool>>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

#[test]
fn test_dropping_unfinished_task_tears_down_body() {
    let dropped = Rc::new(Cell::new(false));
    let guard = DropFlag(dropped.clone());

    let mut task = Task::new(move |co| async move {
        let _guard = guard;
        for _ in 0.. {
            co.suspend().await;
        }
        Ok(())
    });

    task.resume().unwrap();
    task.resume().unwrap();
    assert!(!dropped.get());

    drop(task);
    assert!(dropped.get(), "body locals should be released with the task");
}

#[test]
fn test_dropping_root_tears_down_delegated_child() {
    let dropped = Rc::new(Cell::new(false));
    let guard = DropFlag(dropped.clone());

    let child = Task::new(move |co| async move {
        let _guard = guard;
        for _ in 0.. {
            co.suspend().await;
        }
        Ok(())
    });

    let mut task = Task::new(move |co| async move {
        co.delegate(child).await?;
        Ok(())
    });

    task.resume().unwrap();
    assert_eq!(task.depth(), 2);
    assert!(!dropped.get());

    drop(task);
    assert!(dropped.get(), "delegated child should be released with its root");
}

#[test]
#[should_panic(expected = "awaited something other than a suspension point")]
fn test_foreign_awaitable_is_rejected() {
    let mut task = Task::new(|_co| async move {
        futures::future::pending::<()>().await;
        Ok(())
    });

    let _ = task.resume();
}

#[test]
#[should_panic(expected = "two suspension requests in a single step")]
fn test_two_requests_in_one_step_are_rejected() {
    let mut task = Task::new(|co| async move {
        futures::join!(co.suspend(), co.suspend());
        Ok(())
    });

    let _ = task.resume();
}

#[test]
fn test_debug_output_reports_state() {
    let mut task = Task::new(|co| async move {
        co.suspend().await;
        Ok(())
    });

    assert!(format!("{task:?}").contains("done: false"));

    task.resume().unwrap();
    task.resume().unwrap();
    assert_eq!(format!("{task:?}"), "Task { done: true }");
}
