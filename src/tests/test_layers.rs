use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::layers::{DenseLayer, WeightInit};

#[test]
fn test_layer_creation() {
    let mut rng = StdRng::seed_from_u64(0);
    let layer = DenseLayer::new(3, 2, Activation::Relu, &mut rng);

    assert_eq!(layer.weights.shape(), [3, 2]);
    assert_eq!(layer.biases.shape(), [2]);
    assert!(layer.biases.iter().all(|&b| b == 0.0));
    assert_eq!(layer.input_size(), 3);
    assert_eq!(layer.output_size(), 2);
    assert_eq!(layer.parameter_count(), 8);
}

#[test]
fn test_weight_initialization_bounds() {
    let mut rng = StdRng::seed_from_u64(1);
    let layer = DenseLayer::new_with_init(10, 20, Activation::Tanh, WeightInit::XavierUniform, &mut rng);
    let limit = (6.0 / 30.0_f32).sqrt();
    assert!(layer.weights.iter().all(|&w| w >= -limit && w <= limit));

    let layer = DenseLayer::new_with_init(10, 20, Activation::Relu, WeightInit::HeUniform, &mut rng);
    let limit = (6.0 / 10.0_f32).sqrt();
    assert!(layer.weights.iter().all(|&w| w >= -limit && w <= limit));
}

#[test]
fn test_init_for_activation() {
    assert_eq!(WeightInit::for_activation(&Activation::Relu), WeightInit::HeUniform);
    assert_eq!(WeightInit::for_activation(&Activation::Linear), WeightInit::XavierUniform);
}

#[test]
fn test_same_seed_same_weights() {
    let a = DenseLayer::new(4, 3, Activation::Relu, &mut StdRng::seed_from_u64(9));
    let b = DenseLayer::new(4, 3, Activation::Relu, &mut StdRng::seed_from_u64(9));
    assert_eq!(a.weights, b.weights);
}

#[test]
fn test_predict_matches_forward() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut layer = DenseLayer::new(3, 2, Activation::Relu, &mut rng);
    let input = array![[1.0, 2.0, 3.0], [-1.0, 0.5, 0.0]];

    let predicted = layer.predict_batch(input.view());
    let forwarded = layer.forward_batch(input.view());
    assert_eq!(predicted, forwarded);
    assert_eq!(predicted.shape(), [2, 2]);
}

#[test]
fn test_backward_requires_forward() {
    let mut rng = StdRng::seed_from_u64(3);
    let layer = DenseLayer::new(2, 2, Activation::Linear, &mut rng);
    assert!(layer.backward_batch(Array2::zeros((1, 2)).view()).is_none());
}

#[test]
fn test_backward_gradients_linear() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut layer = DenseLayer::new(2, 1, Activation::Linear, &mut rng);
    let input = array![[1.0, 2.0]];
    layer.forward_batch(input.view());

    let (adjusted, weight_grad, bias_grad) = layer.backward_batch(array![[0.5]].view()).unwrap();
    assert_eq!(adjusted, array![[0.5]]);
    assert_eq!(weight_grad, array![[0.5], [1.0]]);
    assert_eq!(bias_grad, array![0.5]);
}

#[test]
fn test_copy_parameters_from() {
    let mut rng = StdRng::seed_from_u64(5);
    let source = DenseLayer::new(3, 3, Activation::Relu, &mut rng);
    let mut target = DenseLayer::new(3, 3, Activation::Relu, &mut rng);
    assert_ne!(source.weights, target.weights);

    target.copy_parameters_from(&source);
    assert_eq!(source.weights, target.weights);
    assert_eq!(source.biases, target.biases);
}
