mod common;

use std::sync::Arc;

use common::{flowers, houses, points, Flower, House, Point};
use hyperml::{create_model_builder, EngineCfg, HyperError, ModelTuning, Task, TrainedModel};

fn train<T, L>(task: Task, columns: [&str; 3], data: &[T]) -> TrainedModel<T, L>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
    L: hyperml::Label,
{
    let [first, second, label] = columns;
    create_model_builder::<T, L>()
        .with_config(EngineCfg::default())
        .set_task(task)
        .with_features([first, second])
        .with_label(label)
        .train(data)
        .unwrap()
}

fn point_model<L: hyperml::Label>(task: Task, n: usize, seed: u64) -> TrainedModel<Point, L> {
    train(task, ["x1", "x2", "label"], &points(n, seed))
}

fn house_model() -> TrainedModel<House, f32> {
    let data = houses(100, 4);
    train(Task::Regression, ["size", "rooms", "price"], &data)
}

#[test]
fn fine_tuning_appends_one_stage_and_shares_the_rest() {
    let model = point_model::<bool>(Task::BinaryClassification, 200, 1);
    let before = model.pipeline().clone();

    let tuned = model.fine_tune(&points(80, 2)).unwrap();

    assert_eq!(model.pipeline(), &before);
    assert_eq!(model.pipeline().len(), 3);
    assert_eq!(tuned.pipeline().len(), 4);
    let shared = tuned.pipeline().stages();
    for (original, shared) in model.pipeline().stages().iter().zip(shared) {
        assert!(Arc::ptr_eq(original, shared));
    }
    assert_eq!(tuned.task(), Task::BinaryClassification);
    assert_eq!(tuned.feature_spec(), model.feature_spec());

    let metrics = tuned.evaluate(&points(60, 3)).unwrap();
    assert!(metrics.get_metric("Accuracy") > 0.9);
}

#[test]
fn fine_tuned_model_trains_on_the_new_data() {
    let model = house_model();
    let tuning_data = houses(30, 5);
    let tuned = model.fine_tune_with(&tuning_data, 50, 0.1).unwrap();

    assert_eq!(model.training_rows(), 100);
    assert_eq!(tuned.training_rows(), 30);
    assert_eq!(tuned.training_schema(), model.training_schema());
    let metrics = tuned.evaluate(&houses(40, 6)).unwrap();
    assert!(metrics.get_metric("RSquared") > 0.9);
}

#[test]
fn stored_tuning_config_does_not_drive_fine_tuning() {
    let mut model = house_model();
    model.set_l2_regularization(1e9).unwrap();
    let tuning_data = houses(30, 5);
    let test_data = houses(40, 6);

    let tuned = model.fine_tune(&tuning_data).unwrap();
    assert_eq!(tuned.l2_regularization(), 1e9);
    let metrics = tuned.evaluate(&test_data).unwrap();
    assert!(metrics.get_metric("RSquared") > 0.9);

    let shrunk = model.fine_tune_with(&tuning_data, 100, 1e9).unwrap();
    let metrics = shrunk.evaluate(&test_data).unwrap();
    assert!(metrics.get_metric("RSquared") < 0.1);
}

#[test]
fn multiclass_fine_tuning_keeps_the_class_labels() {
    let task = Task::MulticlassClassification;
    let data = flowers(150, 7);
    let model: TrainedModel<Flower, String> = train(task, ["a", "b", "species"], &data);
    let mut tuned = model.fine_tune(&flowers(60, 8)).unwrap();

    let sample = Flower {
        a: 0.0,
        b: 5.0,
        species: String::new(),
    };
    assert_eq!(tuned.predict(&sample).unwrap(), "virginica");
}

#[test]
fn clustering_cannot_be_fine_tuned() {
    let model = point_model::<u32>(Task::Clustering, 50, 9);
    let err = model.fine_tune(&points(10, 10)).unwrap_err();
    assert!(matches!(err, HyperError::UnsupportedTask(Task::Clustering)));
}

#[test]
fn invalid_l2_is_rejected() {
    let model = point_model::<bool>(Task::BinaryClassification, 50, 11);
    let err = model.fine_tune_with(&points(10, 12), 10, -1.0).unwrap_err();
    assert!(matches!(err, HyperError::InvalidConfig(_)));
}

#[test]
fn tuning_config_is_stored_and_carried_over() {
    let mut model = point_model::<bool>(Task::BinaryClassification, 50, 13);
    assert_eq!(model.maximum_number_of_iterations(), 100);
    assert_eq!(model.l2_regularization(), 0.01);

    model.set_maximum_number_of_iterations(25);
    model.set_l2_regularization(0.5).unwrap();
    assert!(model.set_l2_regularization(-0.5).is_err());
    assert!(model.set_l2_regularization(f32::NAN).is_err());
    assert_eq!(model.l2_regularization(), 0.5);

    let tuned = model.fine_tune(&points(20, 14)).unwrap();
    assert_eq!(tuned.maximum_number_of_iterations(), 25);
    assert_eq!(tuned.l2_regularization(), 0.5);
}
