use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::{Array4, ArrayView2};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::adapters::onnx::postprocess::{decode_predictions, to_feature_major, Letterbox, LETTERBOX_FILL};
use crate::application::ports::DetectorPort;
use crate::domain::detection::Detection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::labels::LabelSet;
use crate::domain::model::{InferenceConfig, YoloParams};

/// Modelo YOLO (exportación ONNX de Ultralytics) cargado una sola vez al arrancar.
pub struct OnnxYoloEngine {
    // `Session::run` necesita acceso exclusivo.
    session: Mutex<Session>,
    params: YoloParams,
    labels: LabelSet,
}

impl OnnxYoloEngine {
    pub fn load(config: &InferenceConfig, intra_threads: usize) -> Result<Self> {
        let path = &config.model.onnx_path;
        let mut builder = Session::builder()?.with_intra_threads(intra_threads)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("cannot load ONNX model {}", path))?;

        let labels = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("names").ok().flatten())
            .map(|raw| LabelSet::from_ultralytics_metadata(&raw))
            .unwrap_or_default();

        info!("Modelo '{}' cargado desde {} ({} clases con nombre)", config.model.name, path, labels.len());

        Ok(Self {
            session: Mutex::new(session),
            params: config.params.clone(),
            labels,
        })
    }

    pub fn infer(&self, rgb: &RgbImage) -> Result<Vec<Detection>> {
        let letterbox = Letterbox::fit(rgb.width(), rgb.height(), self.params.input_size);
        let size = self.params.input_size as i64;
        let input_tensor = Tensor::from_array((vec![1, 3, size, size], letterbox_tensor(rgb, &letterbox)))?;

        let mut session = lock_session(&self.session);
        let outputs = session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[0] != 1 {
            bail!("unexpected YOLO output shape {:?}", dims);
        }
        debug!("Salida del modelo: {:?}", dims);

        let view = ArrayView2::from_shape((dims[1], dims[2]), data_out)?;
        decode_predictions(to_feature_major(view, self.params.input_size), &letterbox, &self.params, rgb.width(), rgb.height())
    }
}

impl DetectorPort for OnnxYoloEngine {
    fn detect(&self, image: &RgbImage) -> DomainResult<Vec<Detection>> {
        self.infer(image).map_err(|e| DomainError::Inference(format!("{e:#}")))
    }

    fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

// Un pánico en otra petición envenena el mutex; la sesión sigue siendo válida.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Letterbox a `size x size` y conversión a tensor NCHW normalizado en [0, 1].
fn letterbox_tensor(rgb: &RgbImage, letterbox: &Letterbox) -> Vec<f32> {
    let resized = image::imageops::resize(rgb, letterbox.new_w, letterbox.new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(letterbox.size, letterbox.size, Rgb([LETTERBOX_FILL; 3]));
    image::imageops::replace(&mut canvas, &resized, letterbox.pad_x as i64, letterbox.pad_y as i64);

    let imgsz = letterbox.size as usize;
    let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
    }

    input.into_raw_vec_and_offset().0
}
