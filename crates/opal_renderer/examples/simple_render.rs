//! Simple ray tracer example.
//!
//! Renders a small scene — spheres, a box, a cylinder, soft shadows from
//! an area light — and saves it to PPM format.

use opal_renderer::{
    render, AaBox, AreaLight, BlinnPhong, Color, Cylinder, Glaze, Instance, Lambertian, Matrix4,
    PerspectiveCamera, PointLight, SceneBuilder, SceneError, Sphere, Vec3,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

fn main() {
    env_logger::init();

    let mut scene = match build_scene() {
        Ok(scene) => scene,
        Err(err) => {
            eprintln!("scene construction failed: {err}");
            std::process::exit(1);
        }
    };

    let (width, height) = (640, 360);
    println!("Rendering {width}x{height}...");

    let start = std::time::Instant::now();
    let image = render(&mut scene, width, height, 0);
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.ppm";
    save_ppm(&image, filename).expect("Failed to save image");
    println!("Saved to {filename}");
}

fn build_scene() -> Result<opal_renderer::Scene, SceneError> {
    let camera = PerspectiveCamera::new(
        Vec3::new(0.0, 2.0, 8.0),
        Vec3::new(0.0, -0.2, -1.0),
        1.0,
        2.0,
    );

    let mut builder = SceneBuilder::new()
        .with_camera(camera)
        .with_ambient(Color::splat(0.05))
        .with_background(Color::new(0.2, 0.3, 0.5))
        .with_samples_per_pixel(16);

    builder.define_shader("ground", Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5))));
    builder.define_shader(
        "chrome",
        Arc::new(BlinnPhong::new(
            Color::new(0.3, 0.3, 0.3),
            Color::splat(0.8),
            80.0,
            0.6,
        )),
    );
    builder.define_shader(
        "glaze",
        Arc::new(Glaze::new(Color::new(0.7, 0.2, 0.1), 0.3, 0.05)),
    );
    builder.define_shader("matte", Arc::new(Lambertian::new(Color::new(0.2, 0.5, 0.8))));

    // Ground slab.
    builder.add_primitive(Box::new(AaBox::new(
        Vec3::new(-20.0, -1.0, -20.0),
        Vec3::new(20.0, 0.0, 20.0),
        builder.shader("ground")?,
    )));

    // Main spheres.
    builder.add_primitive(Box::new(Sphere::new(
        Vec3::new(-2.0, 1.0, 0.0),
        1.0,
        builder.shader("chrome")?,
    )));
    builder.add_primitive(Box::new(Sphere::new(
        Vec3::new(2.0, 1.0, 0.0),
        1.0,
        builder.shader("glaze")?,
    )));

    // A cylinder and a stretched instance of a unit sphere.
    builder.add_primitive(Box::new(Cylinder::new(
        Vec3::new(0.0, 0.75, -2.0),
        1.5,
        0.5,
        builder.shader("matte")?,
    )));
    let prototype: Arc<Sphere> = Arc::new(Sphere::new(
        Vec3::ZERO,
        1.0,
        builder.shader("matte")?,
    ));
    builder.add_primitive(Box::new(Instance::new(
        Matrix4::translation(0.0, 0.35, 2.5) * Matrix4::scale(1.2, 0.35, 1.2),
        prototype,
        None,
    )?));

    // Key light with soft shadows, plus a dim fill.
    builder.add_light(Box::new(AreaLight::new(
        Vec3::new(4.0, 8.0, 4.0),
        Vec3::new(-0.5, -1.0, -0.5),
        Color::splat(0.9),
        2.0,
        2.0,
    )));
    builder.add_light(Box::new(PointLight::new(
        Vec3::new(-6.0, 4.0, 3.0),
        Color::splat(0.25),
    )));

    builder.build()
}

/// Write the framebuffer as a binary PPM, clamping to displayable range.
/// Row 0 of the framebuffer is the image bottom, so rows are flipped here.
fn save_ppm(image: &opal_renderer::Framebuffer, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P6")?;
    writeln!(writer, "{} {}", image.width(), image.height())?;
    writeln!(writer, "255")?;

    for y in (0..image.height()).rev() {
        for color in image.row(y) {
            let bytes = [
                (color.x.clamp(0.0, 1.0) * 255.0) as u8,
                (color.y.clamp(0.0, 1.0) * 255.0) as u8,
                (color.z.clamp(0.0, 1.0) * 255.0) as u8,
            ];
            writer.write_all(&bytes)?;
        }
    }

    Ok(())
}
