use cotask::Task;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct World {
    x: Cell<u32>,
    y: Cell<u32>,
}

fn count(dest: impl Fn() + 'static, n: u32) -> Task {
    Task::new(move |co| async move {
        for _ in 0..n {
            dest();
            co.suspend().await;
        }
        Ok(())
    })
}

fn count_xy(world: Rc<World>, a: u32, b: u32) -> Task {
    Task::new(move |co| async move {
        let w = world.clone();
        co.delegate(count(move || w.x.set(w.x.get() + 1), a)).await?;
        let w = world.clone();
        co.delegate(count(move || w.y.set(w.y.get() + 1), b)).await?;
        Ok(())
    })
}

#[test]
fn test_sequential_delegation_drains_tree() {
    let world = Rc::new(World::default());
    let mut task = count_xy(world.clone(), 3, 5);

    let mut resumes = 0;
    while !task.done() {
        task.resume().unwrap();
        resumes += 1;
    }

    assert_eq!(world.x.get(), 3);
    assert_eq!(world.y.get(), 5);
    // One resume per increment, one to finish the first child and enter the
    // second, one to finish the second child and the parent.
    assert_eq!(resumes, 9);
}

#[test]
fn test_finished_child_hands_over_in_same_resume() {
    let world = Rc::new(World::default());
    let mut task = count_xy(world.clone(), 3, 5);

    for _ in 0..3 {
        task.resume().unwrap();
    }
    assert_eq!((world.x.get(), world.y.get()), (3, 0));
    assert_eq!(task.depth(), 2);

    // The first child finishes, the parent continues and the second child
    // takes its first step, all within one resume.
    task.resume().unwrap();
    assert_eq!((world.x.get(), world.y.get()), (3, 1));
    assert_eq!(task.depth(), 2);
}

#[test]
fn test_delegated_child_runs_immediately() {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();

    let mut task = Task::new(move |co| async move {
        co.delegate(count(move || h.set(h.get() + 1), 2)).await?;
        Ok(())
    });

    task.resume().unwrap();
    assert_eq!(hits.get(), 1, "child should take its first step on delegation");
}

fn nest(depth: u32, trail: Rc<RefCell<Vec<u32>>>) -> Task {
    Task::new(move |co| async move {
        if depth == 0 {
            co.suspend().await;
        } else {
            co.delegate(nest(depth - 1, trail.clone())).await?;
        }
        trail.borrow_mut().push(depth);
        Ok(())
    })
}

#[test]
fn test_deep_chain_collapses_in_one_resume() {
    let trail = Rc::new(RefCell::new(Vec::new()));
    let mut task = nest(32, trail.clone());

    task.resume().unwrap();
    assert_eq!(task.depth(), 33, "every level should be spliced into the chain");
    assert!(trail.borrow().is_empty());

    task.resume().unwrap();
    assert!(task.done(), "whole chain should unwind in a single resume");
    assert_eq!(*trail.borrow(), (0..=32).collect::<Vec<_>>());
}

#[test]
fn test_delegating_to_empty_task_does_not_suspend() {
    let steps = Rc::new(Cell::new(0));
    let s = steps.clone();

    let mut task = Task::new(move |co| async move {
        co.delegate(Task::empty()).await?;
        s.set(1);
        co.delegate(Task::default()).await?;
        s.set(2);
        Ok(())
    });

    task.resume().unwrap();
    assert_eq!(steps.get(), 2);
    assert!(task.done());
}

#[test]
fn test_delegating_partially_run_task_continues_it() {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();

    let mut child = count(move || h.set(h.get() + 1), 3);
    child.resume().unwrap();
    assert_eq!(hits.get(), 1);

    let mut task = Task::new(move |co| async move {
        co.delegate(child).await?;
        Ok(())
    });

    task.resume().unwrap();
    assert_eq!(hits.get(), 2, "child resumes where it left off");

    task.resume().unwrap();
    assert_eq!(hits.get(), 3);
    assert!(!task.done());

    task.resume().unwrap();
    assert!(task.done());
}

#[test]
fn test_delegating_task_with_own_chain_moves_whole_chain() {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();

    let mut middle = Task::new(move |co| async move {
        co.delegate(count(move || h.set(h.get() + 1), 2)).await?;
        Ok(())
    });
    middle.resume().unwrap();
    assert_eq!(middle.depth(), 2);
    assert_eq!(hits.get(), 1);

    let mut task = Task::new(move |co| async move {
        co.delegate(middle).await?;
        Ok(())
    });

    task.resume().unwrap();
    assert_eq!(task.depth(), 3, "both frames of the child chain are spliced in");
    assert_eq!(hits.get(), 2, "the child's active leaf is the one resumed");

    task.resume().unwrap();
    assert!(task.done());
}

#[test]
fn test_nested_delegations_resume_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let inner_log = log.clone();
    let inner = Task::new(move |co| async move {
        inner_log.borrow_mut().push("inner start");
        co.suspend().await;
        inner_log.borrow_mut().push("inner end");
        Ok(())
    });

    let outer_log = log.clone();
    let mut task = Task::new(move |co| async move {
        outer_log.borrow_mut().push("outer start");
        co.delegate(inner).await?;
        outer_log.borrow_mut().push("outer after inner");
        co.suspend().await;
        outer_log.borrow_mut().push("outer end");
        Ok(())
    });

    task.resume().unwrap();
    assert_eq!(*log.borrow(), ["outer start", "inner start"]);

    task.resume().unwrap();
    assert_eq!(
        *log.borrow(),
        ["outer start", "inner start", "inner end", "outer after inner"]
    );
    assert_eq!(task.depth(), 1);

    task.resume().unwrap();
    assert!(task.done());
    assert_eq!(log.borrow().last(), Some(&"outer end"));
}
